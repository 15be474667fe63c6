//! Write Hooks
//!
//! Adapters a write path calls after creating, updating or deleting records,
//! invalidating the owning cache.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::store::RecordId;

use super::ServiceRegistry;

/// Anything holding cached state for a collection.
#[async_trait]
pub trait Invalidate: Send + Sync {
    /// Clears cached state for `id`, or everything when `id` is `None`.
    async fn invalidate(&self, id: Option<RecordId>);
}

type Resolver = Arc<dyn Fn() -> Result<Arc<dyn Invalidate>> + Send + Sync>;

// == Invalidation Hooks ==
/// Hooks for one collection.
///
/// The target is resolved each time a hook fires, not when the hooks are
/// built, so hooks can be created before the service they invalidate.
#[derive(Clone)]
pub struct InvalidationHooks {
    collection: Arc<str>,
    resolve: Resolver,
}

impl InvalidationHooks {
    pub fn new<F>(collection: impl Into<Arc<str>>, resolve: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Invalidate>> + Send + Sync + 'static,
    {
        Self {
            collection: collection.into(),
            resolve: Arc::new(resolve),
        }
    }

    /// Hooks that look up the `T` instance in `registry` when they fire.
    pub fn from_registry<T>(collection: impl Into<Arc<str>>, registry: Arc<ServiceRegistry>) -> Self
    where
        T: Invalidate + 'static,
    {
        Self::new(collection, move || {
            registry.get::<T>().map(|service| service as Arc<dyn Invalidate>)
        })
    }

    /// Hooks bound to an existing target.
    pub fn for_target(collection: impl Into<Arc<str>>, target: Arc<dyn Invalidate>) -> Self {
        Self::new(collection, move || Ok(Arc::clone(&target)))
    }

    /// After a record was created or updated.
    pub async fn after_change(&self, id: RecordId) -> Result<()> {
        self.fire("change", Some(id)).await
    }

    /// After a record was deleted.
    pub async fn after_delete(&self, id: RecordId) -> Result<()> {
        self.fire("delete", Some(id)).await
    }

    /// After a bulk write touching an unknown set of records.
    pub async fn after_bulk_import(&self) -> Result<()> {
        self.fire("bulk import", None).await
    }

    async fn fire(&self, event: &str, id: Option<RecordId>) -> Result<()> {
        let target = (self.resolve)()?;
        debug!(collection = %self.collection, event, ?id, "write hook fired");
        target.invalidate(id).await;
        Ok(())
    }
}
