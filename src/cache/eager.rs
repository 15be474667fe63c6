//! Eager Cache
//!
//! Holds the whole collection as one snapshot with one expiry. A stale read
//! triggers a single full reload shared by every concurrent caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::mapper::Dto;
use crate::store::RecordId;

use super::{CollectionSnapshot, LoadContext, Scope, SingleFlight, SlugFn};

// == Eager Cache ==
pub struct EagerCache<D> {
    snapshot: Arc<RwLock<Arc<CollectionSnapshot<D>>>>,
    /// Bumped by every invalidation; a load installs its result only if the
    /// generation it started under is still current
    generation: Arc<AtomicU64>,
    flights: SingleFlight<Scope, Arc<CollectionSnapshot<D>>>,
    slug_of: Option<SlugFn<D>>,
}

impl<D: Dto> EagerCache<D> {
    // == Constructor ==
    /// Creates an empty cache without a slug index.
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(CollectionSnapshot::empty()))),
            generation: Arc::new(AtomicU64::new(0)),
            flights: SingleFlight::new(),
            slug_of: None,
        }
    }

    /// Creates an empty cache that also indexes every snapshot by slug.
    pub fn with_slug_index(slug_of: SlugFn<D>) -> Self {
        Self {
            slug_of: Some(slug_of),
            ..Self::new()
        }
    }

    pub fn has_slug_index(&self) -> bool {
        self.slug_of.is_some()
    }

    // == Get By Id ==
    /// Looks up one DTO. An id missing from a fresh snapshot is a plain
    /// negative answer and does not force a reload.
    pub async fn get_by_id(&self, ctx: &LoadContext<D>, id: RecordId) -> Result<Option<Arc<D>>> {
        let snapshot = self.fresh_snapshot(ctx).await?;
        let found = snapshot.get(id);
        if found.is_none() {
            cache_event!(ctx, id, "id not in snapshot");
        }
        Ok(found)
    }

    // == Get All ==
    /// All DTOs in store order.
    pub async fn get_all(&self, ctx: &LoadContext<D>) -> Result<Vec<Arc<D>>> {
        Ok(self.fresh_snapshot(ctx).await?.values())
    }

    // == Get By Slug ==
    /// Looks up one DTO through the slug index of a fresh snapshot.
    pub async fn get_by_slug(&self, ctx: &LoadContext<D>, slug: &str) -> Result<Option<Arc<D>>> {
        Ok(self.fresh_snapshot(ctx).await?.get_by_slug(slug))
    }

    // == Fresh Snapshot ==
    /// Returns the current snapshot, reloading it first if it is stale.
    pub async fn fresh_snapshot(&self, ctx: &LoadContext<D>) -> Result<Arc<CollectionSnapshot<D>>> {
        let current = Arc::clone(&*self.snapshot.read().await);

        if current.is_fresh(ctx.now_ms()) {
            ctx.counters().record_hit();
            cache_event!(ctx, "cache hit");
            return Ok(current);
        }

        ctx.counters().record_miss();
        cache_event!(ctx, expires_at = ?current.expires_at(), "cache miss, snapshot stale");
        self.refresh(ctx).await
    }

    // == Refresh ==
    /// Full reload through the single-flight coordinator.
    ///
    /// On failure the previous snapshot stays in place, untouched and still
    /// stale, and the error goes to every caller of this load.
    ///
    /// A caller that saw a stale snapshot may only get here after another
    /// load already installed a fresh one; that snapshot is returned as is.
    async fn refresh(&self, ctx: &LoadContext<D>) -> Result<Arc<CollectionSnapshot<D>>> {
        let ctx = ctx.clone();
        let slot = Arc::clone(&self.snapshot);
        let generation = Arc::clone(&self.generation);
        let slug_of = self.slug_of;

        self.flights
            .run(Scope::Collection, move || async move {
                let started = generation.load(Ordering::SeqCst);
                let current = Arc::clone(&*slot.read().await);
                if current.is_fresh(ctx.now_ms()) {
                    cache_event!(ctx, "snapshot already refreshed, load skipped");
                    return Ok(current);
                }

                ctx.counters().record_load();
                cache_event!(ctx, "refresh started");

                let dtos = match ctx.source().load_all().await {
                    Ok(dtos) => dtos,
                    Err(err) => {
                        ctx.counters().record_load_failure();
                        warn!(
                            collection = %ctx.collection(),
                            error = %err,
                            "full refresh failed, keeping previous snapshot"
                        );
                        return Err(err);
                    }
                };

                let ttl_ms = ctx.settings().ttl_ms();
                let next = Arc::new(CollectionSnapshot::build(dtos, slug_of, ctx.now_ms(), ttl_ms));

                let mut guard = slot.write().await;
                if generation.load(Ordering::SeqCst) == started {
                    *guard = Arc::clone(&next);
                    cache_event!(ctx, entries = next.len(), "refresh finished");
                } else {
                    cache_event!(ctx, "refresh finished after invalidation, result not kept");
                }

                Ok(next)
            })
            .await
    }

    // == Invalidate ==
    /// Drops the snapshot and its slug index. The next read reloads.
    pub async fn invalidate(&self) {
        let mut guard = self.snapshot.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *guard = Arc::new(CollectionSnapshot::empty());
    }

    // == Current ==
    /// The snapshot as it is now, fresh or not, without loading.
    pub async fn current(&self) -> Arc<CollectionSnapshot<D>> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Whether a full reload is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.flights.is_pending(&Scope::Collection)
    }
}

impl<D: Dto> Default for EagerCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::{item, Harness, Item};
    use crate::config::LoadingMode;
    use crate::error::CacheError;
    use crate::mapper::SlugDto;

    fn slugged() -> EagerCache<Item> {
        EagerCache::with_slug_index(<Item as SlugDto>::slug)
    }

    fn three_items() -> Vec<Item> {
        vec![item(1, "one"), item(2, "two"), item(3, "three")]
    }

    #[tokio::test]
    async fn test_first_read_loads_whole_collection() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        let all = cache.get_all(&h.ctx).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(h.source.all_calls(), 1);

        // Served from memory afterwards
        assert_eq!(cache.get_by_id(&h.ctx, 2).await.unwrap().unwrap().slug, "two");
        assert_eq!(cache.get_all(&h.ctx).await.unwrap().len(), 3);
        assert_eq!(h.source.all_calls(), 1);
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        cache.get_all(&h.ctx).await.unwrap();

        h.clock.advance_ms(1_000);
        cache.get_all(&h.ctx).await.unwrap();
        assert_eq!(h.source.all_calls(), 1, "still fresh exactly at expiry");

        h.clock.advance_ms(1);
        cache.get_all(&h.ctx).await.unwrap();
        assert_eq!(h.source.all_calls(), 2, "stale once past expiry");
    }

    #[tokio::test]
    async fn test_missing_id_on_fresh_snapshot_does_not_reload() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        assert!(cache.get_by_id(&h.ctx, 99).await.unwrap().is_none());
        assert!(cache.get_by_id(&h.ctx, 99).await.unwrap().is_none());
        assert_eq!(h.source.all_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_stale_reads_share_one_refresh() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        let (a, b, c) = tokio::join!(
            cache.get_by_id(&h.ctx, 1),
            cache.get_all(&h.ctx),
            cache.get_by_slug(&h.ctx, "three"),
        );

        assert_eq!(h.source.all_calls(), 1);
        assert_eq!(a.unwrap().unwrap().id, 1);
        assert_eq!(b.unwrap().len(), 3);
        assert_eq!(c.unwrap().unwrap().id, 3);
        assert!(!cache.is_refreshing());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_snapshot() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        cache.get_all(&h.ctx).await.unwrap();
        let before = cache.current().await;

        h.clock.advance_secs(5);
        h.source.set_failing(true);

        let err = cache.get_by_id(&h.ctx, 1).await.unwrap_err();
        assert!(matches!(err, CacheError::StoreFailure(_)));

        let after = cache.current().await;
        assert!(Arc::ptr_eq(&before, &after), "stale snapshot left in place");
        assert_eq!(after.expires_at(), before.expires_at(), "expiry not advanced");
        assert_eq!(h.ctx.counters().snapshot(LoadingMode::Eager, 0).load_failures, 1);

        // Next read tries again
        h.source.set_failing(false);
        assert!(cache.get_by_id(&h.ctx, 1).await.unwrap().is_some());
        assert_eq!(h.source.all_calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_reaches_every_attached_caller() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        h.source.set_failing(true);
        let cache = slugged();

        let (a, b) = tokio::join!(cache.get_all(&h.ctx), cache.get_by_id(&h.ctx, 1));
        assert!(matches!(a, Err(CacheError::StoreFailure(_))));
        assert!(matches!(b, Err(CacheError::StoreFailure(_))));
        assert_eq!(h.source.all_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_clears_snapshot_and_slugs() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        cache.get_all(&h.ctx).await.unwrap();
        cache.invalidate().await;

        let current = cache.current().await;
        assert!(current.is_empty());
        assert!(current.slug_index().is_empty());
        assert!(!current.is_fresh(h.ctx.now_ms()));
        // No reload until the next read
        assert_eq!(h.source.all_calls(), 1);

        h.source.set_items(vec![item(1, "uno")]);
        assert_eq!(cache.get_by_slug(&h.ctx, "uno").await.unwrap().unwrap().id, 1);
        assert!(cache.get_by_slug(&h.ctx, "one").await.unwrap().is_none());
        assert_eq!(h.source.all_calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_during_refresh_discards_result() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        let (loaded, ()) = tokio::join!(cache.get_all(&h.ctx), cache.invalidate());

        // The caller still gets its answer, but it is not cached
        assert_eq!(loaded.unwrap().len(), 3);
        assert!(cache.current().await.is_empty());

        cache.get_all(&h.ctx).await.unwrap();
        assert_eq!(h.source.all_calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot_wholesale() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        let old = cache.fresh_snapshot(&h.ctx).await.unwrap();

        h.source.set_items(vec![item(4, "four")]);
        h.clock.advance_secs(2);
        let new = cache.fresh_snapshot(&h.ctx).await.unwrap();

        // Old generation is intact for whoever still holds it
        assert_eq!(old.len(), 3);
        assert!(old.get_by_slug("one").is_some());
        assert_eq!(new.len(), 1);
        assert!(new.get_by_slug("one").is_none());
        assert!(new.get_by_slug("four").is_some());
    }

    #[tokio::test]
    async fn test_late_refresh_reuses_fresh_snapshot() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache = slugged();

        let installed = cache.fresh_snapshot(&h.ctx).await.unwrap();

        // A caller that judged the snapshot stale before it was installed
        let late = cache.refresh(&h.ctx).await.unwrap();
        assert!(Arc::ptr_eq(&installed, &late));
        assert_eq!(h.source.all_calls(), 1);
        assert_eq!(h.ctx.counters().snapshot(LoadingMode::Eager, 0).loads, 1);
    }

    #[tokio::test]
    async fn test_without_slug_index() {
        let h = Harness::new(LoadingMode::Eager, three_items());
        let cache: EagerCache<Item> = EagerCache::new();

        assert!(!cache.has_slug_index());
        assert!(cache.get_by_slug(&h.ctx, "one").await.unwrap().is_none());
        assert_eq!(cache.get_by_id(&h.ctx, 1).await.unwrap().unwrap().slug, "one");
    }
}
