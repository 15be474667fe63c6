//! Cache Module
//!
//! The cache engine: eager whole-collection snapshots, lazy per-id entries,
//! single-flight loading and the slug index built alongside each snapshot.

/// Emits a cache event tagged with the cache identity and collection name,
/// only while the `debug` setting is on.
///
/// The setting is the gate, so events go out at `info` and show up under the
/// server's default filter as soon as `debug` is switched on at runtime.
macro_rules! cache_event {
    ($ctx:expr, $($arg:tt)+) => {
        if $ctx.debug_enabled() {
            tracing::info!(
                cache = %$ctx.cache_id(),
                collection = %$ctx.collection(),
                $($arg)+
            );
        }
    };
}

pub(crate) use cache_event;

mod eager;
mod entry;
mod lazy;
mod single_flight;
mod slug_index;
mod snapshot;
mod source;
mod stats;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export public types
pub use eager::EagerCache;
pub use entry::CacheEntry;
pub use lazy::{LazyCache, SLUG_FIELD};
pub use single_flight::{Scope, SingleFlight};
pub use slug_index::{SlugFn, SlugIndex};
pub use snapshot::CollectionSnapshot;
pub use source::{DtoSource, LoadContext};
pub use stats::{CacheCounters, CacheStats};
