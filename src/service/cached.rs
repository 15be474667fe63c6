//! Cached Collection Service
//!
//! The public read API of a cached collection. Each call reads the loading
//! mode from the settings provider and dispatches to the eager or the lazy
//! cache; writes reach the cache only through `invalidate`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{
    cache_event, CacheStats, DtoSource, EagerCache, LazyCache, LoadContext, SlugFn,
};
use crate::clock::{Clock, SystemClock};
use crate::config::{LoadingMode, SettingsProvider};
use crate::error::{CacheError, Result};
use crate::mapper::{Mapper, SlugDto};
use crate::store::{RecordId, RecordStore};

use super::{CollectionService, Invalidate};

// == Cached Collection Service ==
pub struct CachedCollectionService<S, M>
where
    S: RecordStore,
    M: Mapper<Record = S::Record>,
{
    base: Arc<CollectionService<S, M>>,
    ctx: LoadContext<M::Dto>,
    eager: EagerCache<M::Dto>,
    lazy: LazyCache<M::Dto>,
}

impl<S, M> CachedCollectionService<S, M>
where
    S: RecordStore,
    M: Mapper<Record = S::Record>,
{
    // == Constructor ==
    /// Creates a cached service over `store` for the named collection.
    ///
    /// `settings` is consulted on every call.
    pub fn new(
        store: Arc<S>,
        mapper: M,
        collection: impl Into<String>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self::build(store, mapper, collection.into(), settings, None)
    }

    fn build(
        store: Arc<S>,
        mapper: M,
        collection: String,
        settings: Arc<dyn SettingsProvider>,
        slug_of: Option<SlugFn<M::Dto>>,
    ) -> Self {
        let base = Arc::new(CollectionService::new(store, Arc::new(mapper), collection.clone()));
        let cache_id = short_type_name::<M>();
        let ctx = LoadContext::new(
            collection,
            cache_id,
            Arc::clone(&base) as Arc<dyn DtoSource<M::Dto>>,
            settings,
            Arc::new(SystemClock) as Arc<dyn Clock>,
        );
        let eager = match slug_of {
            Some(slug_of) => EagerCache::with_slug_index(slug_of),
            None => EagerCache::new(),
        };

        Self {
            base,
            ctx,
            eager,
            lazy: LazyCache::new(),
        }
    }

    /// Replaces the clock used for expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ctx = self.ctx.with_clock(clock);
        self
    }

    pub fn collection(&self) -> &str {
        self.ctx.collection()
    }

    /// Uncached access to the same collection.
    pub fn raw(&self) -> &CollectionService<S, M> {
        &self.base
    }

    /// Loading mode in effect right now.
    pub fn loading_mode(&self) -> LoadingMode {
        self.ctx.settings().loading_mode
    }

    // == Get By Id ==
    /// DTO by id; `None` when the record is absent or rejected.
    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<Arc<M::Dto>>> {
        match self.loading_mode() {
            LoadingMode::Eager => self.eager.get_by_id(&self.ctx, id).await,
            LoadingMode::Lazy => self.lazy.get_by_id(&self.ctx, id).await,
        }
    }

    // == Get All ==
    /// Every DTO in store order. In lazy mode this primes the whole cache.
    pub async fn get_all(&self) -> Result<Vec<Arc<M::Dto>>> {
        match self.loading_mode() {
            LoadingMode::Eager => self.eager.get_all(&self.ctx).await,
            LoadingMode::Lazy => self.lazy.get_all(&self.ctx).await,
        }
    }

    // == Invalidate ==
    /// Clears cached state without reloading; the next read loads.
    ///
    /// The eager snapshot and slug index are always dropped whole. Lazy
    /// entries are dropped for `id` only, or all of them when `id` is `None`.
    /// Both strategies are cleared whatever the current mode, so switching
    /// modes later never serves data from before the write.
    pub async fn invalidate(&self, id: Option<RecordId>) {
        let mode = self.loading_mode();
        self.ctx.counters().record_invalidation();

        self.eager.invalidate().await;
        self.lazy.invalidate(id).await;

        cache_event!(self.ctx, ?id, %mode, "cache invalidated");
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let mode = self.loading_mode();
        let total_entries = match mode {
            LoadingMode::Eager => {
                let snapshot = self.eager.current().await;
                if snapshot.is_fresh(self.ctx.now_ms()) {
                    snapshot.len()
                } else {
                    0
                }
            }
            LoadingMode::Lazy => self.lazy.len().await,
        };
        self.ctx.counters().snapshot(mode, total_entries)
    }
}

impl<S, M> CachedCollectionService<S, M>
where
    S: RecordStore,
    M: Mapper<Record = S::Record>,
    M::Dto: SlugDto,
{
    // == Constructor ==
    /// Like `new`, with a slug index kept alongside every eager snapshot.
    pub fn with_slug_index(
        store: Arc<S>,
        mapper: M,
        collection: impl Into<String>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        let slug_of: SlugFn<M::Dto> = <M::Dto as SlugDto>::slug;
        Self::build(store, mapper, collection.into(), settings, Some(slug_of))
    }

    // == Get By Slug (cached) ==
    /// DTO by slug.
    ///
    /// Eager mode answers from the slug index of a fresh snapshot. Lazy mode
    /// has no slug index: it queries the store and caches the DTO under its
    /// id.
    pub async fn get_by_slug_cached(&self, slug: &str) -> Result<Option<Arc<M::Dto>>> {
        if !self.eager.has_slug_index() {
            return Err(CacheError::ConfigurationMissing(format!(
                "slug index not enabled for collection '{}'",
                self.collection()
            )));
        }

        match self.loading_mode() {
            LoadingMode::Eager => self.eager.get_by_slug(&self.ctx, slug).await,
            LoadingMode::Lazy => self.lazy.get_by_slug(&self.ctx, slug).await,
        }
    }

    // == Get By Slug (direct) ==
    /// Full record by slug from the store, bypassing the cache.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<S::Record>> {
        debug!(collection = %self.collection(), slug, "slug lookup bypassing cache");
        self.base.get_by_slug(slug).await
    }
}

#[async_trait]
impl<S, M> Invalidate for CachedCollectionService<S, M>
where
    S: RecordStore,
    M: Mapper<Record = S::Record>,
{
    async fn invalidate(&self, id: Option<RecordId>) {
        CachedCollectionService::invalidate(self, id).await
    }
}

/// Last path segment of a type name, used as the cache identity in logs.
fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
