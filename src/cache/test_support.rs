//! Test doubles for the cache engine.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::clock::ManualClock;
use crate::config::{CacheSettings, LoadingMode, RuntimeSettings};
use crate::error::{CacheError, Result};
use crate::mapper::{Dto, SlugDto};
use crate::store::RecordId;

use super::{DtoSource, LoadContext};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Item {
    pub id: RecordId,
    pub slug: String,
    pub version: u32,
}

impl Dto for Item {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl SlugDto for Item {
    fn slug(&self) -> &str {
        &self.slug
    }
}

pub(crate) fn item(id: RecordId, slug: &str) -> Item {
    Item {
        id,
        slug: slug.to_string(),
        version: 1,
    }
}

/// Source over a mutable item list that counts its calls and can be made
/// to fail. Every load yields once so concurrent callers overlap.
#[derive(Default)]
pub(crate) struct FakeSource {
    items: Mutex<Vec<Item>>,
    failing: AtomicBool,
    all_calls: AtomicUsize,
    one_calls: AtomicUsize,
    field_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn set_items(&self, items: Vec<Item>) {
        *self.items.lock() = items;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn all_calls(&self) -> usize {
        self.all_calls.load(Ordering::SeqCst)
    }

    pub fn one_calls(&self) -> usize {
        self.one_calls.load(Ordering::SeqCst)
    }

    pub fn field_calls(&self) -> usize {
        self.field_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::StoreFailure("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DtoSource<Item> for FakeSource {
    async fn load_all(&self) -> Result<Vec<Arc<Item>>> {
        self.all_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self.items.lock().iter().cloned().map(Arc::new).collect())
    }

    async fn load_one(&self, id: RecordId) -> Result<Option<Arc<Item>>> {
        self.one_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self
            .items
            .lock()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .map(Arc::new))
    }

    async fn load_by_field(&self, field: &str, value: &str) -> Result<Option<Arc<Item>>> {
        self.field_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check()?;
        if field != "slug" {
            return Ok(None);
        }
        Ok(self
            .items
            .lock()
            .iter()
            .find(|item| item.slug == value)
            .cloned()
            .map(Arc::new))
    }
}

/// Everything a cache test needs, wired together.
pub(crate) struct Harness {
    pub source: Arc<FakeSource>,
    pub settings: Arc<RuntimeSettings>,
    pub clock: Arc<ManualClock>,
    pub ctx: LoadContext<Item>,
}

impl Harness {
    /// TTL of one second, starting the clock at t = 10s.
    pub fn new(mode: LoadingMode, items: Vec<Item>) -> Self {
        let source = Arc::new(FakeSource::new(items));
        let settings = Arc::new(RuntimeSettings::new(CacheSettings {
            ttl_seconds: 1,
            loading_mode: mode,
            debug: true,
        }));
        let clock = Arc::new(ManualClock::new(10_000));
        let ctx = LoadContext::new(
            "items",
            "TestCache",
            source.clone() as Arc<dyn DtoSource<Item>>,
            settings.clone(),
            clock.clone(),
        );

        Self {
            source,
            settings,
            clock,
            ctx,
        }
    }
}
