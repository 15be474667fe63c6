//! Service Module
//!
//! Collection services built on the cache engine, the registry that holds
//! one instance of each, and the write hooks that invalidate them.

mod cached;
mod collection;
mod hooks;
mod registry;

pub use cached::CachedCollectionService;
pub use collection::CollectionService;
pub use hooks::{Invalidate, InvalidationHooks};
pub use registry::ServiceRegistry;
