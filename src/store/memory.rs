//! In-Memory Record Store
//!
//! A `RecordStore` over a `BTreeMap`, with the CRUD writes the demo server
//! and the tests need.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Filter, Record, RecordId, RecordStore, Selection, StoreError};

/// Number of read calls served, per method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCalls {
    pub find_by_id: u64,
    pub find_all: u64,
    pub find_by_filter: u64,
}

impl StoreCalls {
    pub fn total(&self) -> u64 {
        self.find_by_id + self.find_all + self.find_by_filter
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    find_by_id: AtomicU64,
    find_all: AtomicU64,
    find_by_filter: AtomicU64,
}

// == In-Memory Store ==
/// Records kept in id order; that order is the store's natural order.
#[derive(Debug)]
pub struct InMemoryStore<R> {
    records: RwLock<BTreeMap<RecordId, R>>,
    next_id: AtomicU64,
    calls: CallCounters,
}

impl<R: Record> InMemoryStore<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            calls: CallCounters::default(),
        }
    }

    /// Creates a store pre-filled with `records`.
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let map: BTreeMap<RecordId, R> = records.into_iter().map(|r| (r.id(), r)).collect();
        let next = map.keys().next_back().map_or(1, |max| max + 1);

        Self {
            records: RwLock::new(map),
            next_id: AtomicU64::new(next),
            calls: CallCounters::default(),
        }
    }

    // == Create ==
    /// Allocates a fresh id and stores the record built from it.
    pub async fn create<F>(&self, build: F) -> R
    where
        F: FnOnce(RecordId) -> R,
    {
        let mut records = self.records.write().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = build(id);
        records.insert(id, record.clone());
        debug!(id, "record created");
        record
    }

    // == Insert ==
    /// Stores a record under its own id. Fails if the id is taken.
    pub async fn insert(&self, record: R) -> Result<R, StoreError> {
        let id = record.id();
        let mut records = self.records.write().await;
        if records.contains_key(&id) {
            return Err(StoreError::Conflict(id));
        }
        records.insert(id, record.clone());
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        Ok(record)
    }

    // == Update ==
    /// Replaces an existing record.
    pub async fn update(&self, record: R) -> Result<R, StoreError> {
        let id = record.id();
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                debug!(id, "record updated");
                Ok(record)
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    // == Delete ==
    pub async fn delete(&self, id: RecordId) -> Result<R, StoreError> {
        let removed = self.records.write().await.remove(&id);
        removed.ok_or(StoreError::NotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Read calls served so far.
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            find_by_id: self.calls.find_by_id.load(Ordering::Relaxed),
            find_all: self.calls.find_all.load(Ordering::Relaxed),
            find_by_filter: self.calls.find_by_filter.load(Ordering::Relaxed),
        }
    }
}

impl<R: Record> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordStore for InMemoryStore<R> {
    type Record = R;

    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>, StoreError> {
        self.calls.find_by_id.fetch_add(1, Ordering::Relaxed);
        Ok(self.records.read().await.get(&id).cloned())
    }

    // Records are held whole, so the projection is not applied.
    async fn find_all(&self, _selection: &Selection) -> Result<Vec<R>, StoreError> {
        self.calls.find_all.fetch_add(1, Ordering::Relaxed);
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn find_by_filter(&self, filter: &Filter, limit: usize) -> Result<Vec<R>, StoreError> {
        self.calls.find_by_filter.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| filter.matches(*record))
            .take(limit)
            .cloned()
            .collect())
    }
}
