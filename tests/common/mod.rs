//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockWriteGuard};

use lookup_cache::catalog::{seed_categories, Category, CategoryMapper, CATEGORIES};
use lookup_cache::clock::ManualClock;
use lookup_cache::config::{CacheSettings, LoadingMode, RuntimeSettings};
use lookup_cache::service::CachedCollectionService;
use lookup_cache::store::{
    Filter, InMemoryStore, RecordId, RecordStore, Selection, StoreCalls, StoreError,
};

pub const START_MS: u64 = 1_000_000;
pub const TTL_SECONDS: u64 = 1;

// == Flaky Store ==
/// In-memory category store that can be switched offline, and whose reads
/// can be held open after they have read their data. The offline check runs
/// once a read is released.
pub struct FlakyStore {
    inner: InMemoryStore<Category>,
    offline: AtomicBool,
    gate: RwLock<()>,
}

impl FlakyStore {
    pub fn seeded() -> Self {
        Self {
            inner: InMemoryStore::with_records(seed_categories()),
            offline: AtomicBool::new(false),
            gate: RwLock::new(()),
        }
    }

    /// Direct access for writes, bypassing the gate.
    pub fn inner(&self) -> &InMemoryStore<Category> {
        &self.inner
    }

    pub fn calls(&self) -> StoreCalls {
        self.inner.calls()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reads complete only after the returned guard is dropped.
    pub async fn hold(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn pass_gate(&self) {
        let _open = self.gate.read().await;
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    type Record = Category;

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Category>, StoreError> {
        let found = self.inner.find_by_id(id).await;
        self.pass_gate().await;
        self.check_online()?;
        found
    }

    async fn find_all(&self, selection: &Selection) -> Result<Vec<Category>, StoreError> {
        let found = self.inner.find_all(selection).await;
        self.pass_gate().await;
        self.check_online()?;
        found
    }

    async fn find_by_filter(
        &self,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Category>, StoreError> {
        let found = self.inner.find_by_filter(filter, limit).await;
        self.pass_gate().await;
        self.check_online()?;
        found
    }
}

pub type FlakyService = CachedCollectionService<FlakyStore, CategoryMapper>;

// == Fixture ==
pub struct Fixture {
    pub store: Arc<FlakyStore>,
    pub settings: Arc<RuntimeSettings>,
    pub clock: Arc<ManualClock>,
    pub service: Arc<FlakyService>,
}

/// A slug-indexed category service with a one second TTL and a manual clock.
pub fn fixture(mode: LoadingMode) -> Fixture {
    let store = Arc::new(FlakyStore::seeded());
    let settings = Arc::new(RuntimeSettings::new(CacheSettings {
        ttl_seconds: TTL_SECONDS,
        loading_mode: mode,
        debug: true,
    }));
    let clock = Arc::new(ManualClock::new(START_MS));
    let service = FlakyService::with_slug_index(
        Arc::clone(&store),
        CategoryMapper,
        CATEGORIES,
        settings.clone(),
    )
    .with_clock(clock.clone());

    Fixture {
        store,
        settings,
        clock,
        service: Arc::new(service),
    }
}

/// Replaces the title of a seeded category, without counting as a read.
pub async fn rename(store: &FlakyStore, id: RecordId, title: &str) {
    let mut category = seed_categories()
        .into_iter()
        .find(|c| c.id == id)
        .expect("seeded category");
    category.title = title.to_string();
    store.inner().update(category).await.unwrap();
}

/// Lets every spawned task run until it blocks.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
