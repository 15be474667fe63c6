//! Load Sources
//!
//! What a cache loads from, and the context every cache operation runs in.

use std::sync::Arc;

use async_trait::async_trait;

use crate::clock::Clock;
use crate::config::{CacheSettings, SettingsProvider};
use crate::error::Result;
use crate::store::RecordId;

use super::CacheCounters;

// == DTO Source ==
/// A record-store fetch followed by the mapper pass.
///
/// Rejected records are already filtered out of what a source returns.
#[async_trait]
pub trait DtoSource<D>: Send + Sync {
    /// The whole collection, in store order.
    async fn load_all(&self) -> Result<Vec<Arc<D>>>;

    /// One record by id; `None` when absent or rejected.
    async fn load_one(&self, id: RecordId) -> Result<Option<Arc<D>>>;

    /// The first record whose `field` equals `value`.
    async fn load_by_field(&self, field: &str, value: &str) -> Result<Option<Arc<D>>>;
}

// == Load Context ==
/// Collaborators shared by the eager and lazy caches of one service.
pub struct LoadContext<D> {
    collection: Arc<str>,
    cache_id: Arc<str>,
    source: Arc<dyn DtoSource<D>>,
    settings: Arc<dyn SettingsProvider>,
    clock: Arc<dyn Clock>,
    counters: Arc<CacheCounters>,
}

impl<D> LoadContext<D> {
    pub fn new(
        collection: impl Into<Arc<str>>,
        cache_id: impl Into<Arc<str>>,
        source: Arc<dyn DtoSource<D>>,
        settings: Arc<dyn SettingsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collection: collection.into(),
            cache_id: cache_id.into(),
            source,
            settings,
            clock,
            counters: Arc::new(CacheCounters::default()),
        }
    }

    /// Same context, different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    pub fn source(&self) -> &Arc<dyn DtoSource<D>> {
        &self.source
    }

    /// Settings as of now; never cached.
    pub fn settings(&self) -> CacheSettings {
        self.settings.current()
    }

    pub fn debug_enabled(&self) -> bool {
        self.settings.current().debug
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }
}

impl<D> Clone for LoadContext<D> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            cache_id: Arc::clone(&self.cache_id),
            source: Arc::clone(&self.source),
            settings: Arc::clone(&self.settings),
            clock: Arc::clone(&self.clock),
            counters: Arc::clone(&self.counters),
        }
    }
}
