//! Lazy Cache
//!
//! Per-id entries, each with its own expiry, loaded on demand. A full
//! listing primes every entry in one load.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{CacheError, Result};
use crate::mapper::Dto;
use crate::store::RecordId;

use super::snapshot::index_by_id;
use super::{CacheEntry, LoadContext, Scope, SingleFlight};

type Entries<D> = HashMap<RecordId, CacheEntry<D>>;

/// Store field holding the slug.
pub const SLUG_FIELD: &str = "slug";

// == Lazy Cache ==
pub struct LazyCache<D> {
    entries: Arc<RwLock<Entries<D>>>,
    /// Bumped by every invalidation; see `EagerCache`
    generation: Arc<AtomicU64>,
    /// Per-id and per-slug loads
    single: SingleFlight<Scope, Option<Arc<D>>>,
    /// Whole-collection primes
    prime: SingleFlight<Scope, Vec<Arc<D>>>,
}

impl<D: Dto> LazyCache<D> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            single: SingleFlight::new(),
            prime: SingleFlight::new(),
        }
    }

    // == Get By Id ==
    /// Serves a fresh entry from memory, or loads that one id.
    ///
    /// Only this id's entry is consulted. An id the store does not have (or
    /// the mapper rejects) is not remembered; the next call asks again.
    pub async fn get_by_id(&self, ctx: &LoadContext<D>, id: RecordId) -> Result<Option<Arc<D>>> {
        let now = ctx.now_ms();
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&id) {
                if !entry.is_expired(now) {
                    ctx.counters().record_hit();
                    cache_event!(ctx, id, "cache hit");
                    return Ok(Some(Arc::clone(&entry.dto)));
                }
            }
        }

        ctx.counters().record_miss();
        cache_event!(ctx, id, "cache miss");
        self.load_by_id(ctx, id).await
    }

    // == Load By Id ==
    async fn load_by_id(&self, ctx: &LoadContext<D>, id: RecordId) -> Result<Option<Arc<D>>> {
        let ctx = ctx.clone();
        let entries = Arc::clone(&self.entries);
        let generation = Arc::clone(&self.generation);

        self.single
            .run(Scope::Id(id), move || async move {
                let started = generation.load(Ordering::SeqCst);

                // Another load may have filled the entry since the caller missed
                let seen = entries.read().await.get(&id).cloned();
                if let Some(entry) = &seen {
                    if !entry.is_expired(ctx.now_ms()) {
                        cache_event!(ctx, id, "entry already loaded, load skipped");
                        return Ok(Some(Arc::clone(&entry.dto)));
                    }
                }

                ctx.counters().record_load();
                cache_event!(ctx, id, "entry load started");

                let loaded = ctx
                    .source()
                    .load_one(id)
                    .await
                    .map_err(|err| load_failed(&ctx, &Scope::Id(id), err))?;

                let mut guard = entries.write().await;
                let current = generation.load(Ordering::SeqCst) == started;
                match &loaded {
                    Some(dto) if current => {
                        let ttl_ms = ctx.settings().ttl_ms();
                        guard.insert(id, CacheEntry::new(Arc::clone(dto), ctx.now_ms(), ttl_ms));
                        cache_event!(ctx, id, "entry load finished");
                    }
                    Some(_) => {
                        cache_event!(ctx, id, "entry loaded after invalidation, not kept");
                    }
                    None => {
                        // Only drop the stale entry this load replaces, never
                        // one installed while it ran
                        let unchanged = match (guard.get(&id), &seen) {
                            (Some(held), Some(seen)) => Arc::ptr_eq(&held.dto, &seen.dto),
                            _ => false,
                        };
                        if current && unchanged {
                            guard.remove(&id);
                        }
                        cache_event!(ctx, id, "record absent, nothing cached");
                    }
                }

                Ok(loaded)
            })
            .await
    }

    // == Get All ==
    /// Primes the whole cache with one collection load and returns it.
    ///
    /// The new entry set replaces every existing entry, including ones
    /// loaded individually.
    pub async fn get_all(&self, ctx: &LoadContext<D>) -> Result<Vec<Arc<D>>> {
        let ctx = ctx.clone();
        let entries = Arc::clone(&self.entries);
        let generation = Arc::clone(&self.generation);

        self.prime
            .run(Scope::Collection, move || async move {
                let started = generation.load(Ordering::SeqCst);
                ctx.counters().record_load();
                cache_event!(ctx, "prime started");

                let dtos = ctx
                    .source()
                    .load_all()
                    .await
                    .map_err(|err| load_failed(&ctx, &Scope::Collection, err))?;

                let (by_id, order) = index_by_id(dtos);
                let now = ctx.now_ms();
                let ttl_ms = ctx.settings().ttl_ms();
                let primed: Entries<D> = by_id
                    .iter()
                    .map(|(id, dto)| (*id, CacheEntry::new(Arc::clone(dto), now, ttl_ms)))
                    .collect();

                let mut guard = entries.write().await;
                if generation.load(Ordering::SeqCst) == started {
                    *guard = primed;
                    cache_event!(ctx, entries = guard.len(), "prime finished");
                } else {
                    cache_event!(ctx, "prime finished after invalidation, not kept");
                }

                Ok(order.iter().filter_map(|id| by_id.get(id).cloned()).collect())
            })
            .await
    }

    // == Get By Slug ==
    /// Asks the store for the record with this slug and caches the result
    /// under its id.
    ///
    /// Nothing is indexed by slug here, so every call queries the store.
    pub async fn get_by_slug(&self, ctx: &LoadContext<D>, slug: &str) -> Result<Option<Arc<D>>> {
        let ctx = ctx.clone();
        let entries = Arc::clone(&self.entries);
        let generation = Arc::clone(&self.generation);
        let slug = slug.to_owned();
        let scope = Scope::Slug(slug.clone());

        self.single
            .run(scope.clone(), move || async move {
                let started = generation.load(Ordering::SeqCst);
                ctx.counters().record_load();
                cache_event!(ctx, %scope, "slug lookup started");

                let loaded = ctx
                    .source()
                    .load_by_field(SLUG_FIELD, &slug)
                    .await
                    .map_err(|err| load_failed(&ctx, &scope, err))?;

                if let Some(dto) = &loaded {
                    let mut guard = entries.write().await;
                    if generation.load(Ordering::SeqCst) == started {
                        let ttl_ms = ctx.settings().ttl_ms();
                        guard.insert(dto.id(), CacheEntry::new(Arc::clone(dto), ctx.now_ms(), ttl_ms));
                    }
                }

                Ok(loaded)
            })
            .await
    }

    // == Invalidate ==
    /// Removes one entry, or every entry when `id` is `None`. Never reloads.
    pub async fn invalidate(&self, id: Option<RecordId>) {
        let mut guard = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        match id {
            Some(id) => {
                guard.remove(&id);
            }
            None => guard.clear(),
        }
    }

    // == Inspection ==
    /// The entry for `id`, expired or not, without loading.
    pub async fn entry(&self, id: RecordId) -> Option<CacheEntry<D>> {
        self.entries.read().await.get(&id).cloned()
    }

    /// Entries held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Whether a load for `id` is in flight.
    pub fn is_loading(&self, id: RecordId) -> bool {
        self.single.is_pending(&Scope::Id(id))
    }
}

impl<D: Dto> Default for LazyCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn load_failed<D>(ctx: &LoadContext<D>, scope: &Scope, err: CacheError) -> CacheError {
    ctx.counters().record_load_failure();
    warn!(
        collection = %ctx.collection(),
        scope = %scope,
        error = %err,
        "lazy load failed"
    );
    err
}
