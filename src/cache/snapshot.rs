//! Collection Snapshot
//!
//! One generation of an eagerly loaded collection: the id map, its slug
//! index and a single shared expiry. A snapshot is never modified after it
//! is built; a refresh builds a new one and swaps it in.

use std::collections::HashMap;
use std::sync::Arc;

use crate::mapper::Dto;
use crate::store::RecordId;

use super::{SlugFn, SlugIndex};

#[derive(Debug)]
pub struct CollectionSnapshot<D> {
    by_id: HashMap<RecordId, Arc<D>>,
    /// Ids in the order the store returned them
    order: Vec<RecordId>,
    slugs: SlugIndex<D>,
    loaded_at: u64,
    /// `None` until the first successful load, and again after invalidation
    expires_at: Option<u64>,
}

impl<D: Dto> CollectionSnapshot<D> {
    /// A snapshot holding nothing, stale by construction.
    pub fn empty() -> Self {
        Self {
            by_id: HashMap::new(),
            order: Vec::new(),
            slugs: SlugIndex::empty(),
            loaded_at: 0,
            expires_at: None,
        }
    }

    /// Builds a snapshot from freshly mapped DTOs.
    ///
    /// The slug index, when requested, is derived from the same id map.
    pub fn build(dtos: Vec<Arc<D>>, slug_of: Option<SlugFn<D>>, now_ms: u64, ttl_ms: u64) -> Self {
        let (by_id, order) = index_by_id(dtos);
        let slugs = match slug_of {
            Some(slug_of) => SlugIndex::build(order.iter().filter_map(|id| by_id.get(id)), slug_of),
            None => SlugIndex::empty(),
        };

        Self {
            by_id,
            order,
            slugs,
            loaded_at: now_ms,
            expires_at: Some(now_ms.saturating_add(ttl_ms)),
        }
    }

    /// Fresh until the clock moves past `expires_at`.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        matches!(self.expires_at, Some(expires) if now_ms <= expires)
    }

    pub fn get(&self, id: RecordId) -> Option<Arc<D>> {
        self.by_id.get(&id).cloned()
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<Arc<D>> {
        self.slugs.get(slug)
    }

    /// All DTOs in store order.
    pub fn values(&self) -> Vec<Arc<D>> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }

    pub fn slug_index(&self) -> &SlugIndex<D> {
        &self.slugs
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn loaded_at(&self) -> u64 {
        self.loaded_at
    }

    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Keys DTOs by id, keeping the position of an id's first appearance and the
/// value of its last.
pub(crate) fn index_by_id<D: Dto>(dtos: Vec<Arc<D>>) -> (HashMap<RecordId, Arc<D>>, Vec<RecordId>) {
    let mut by_id = HashMap::with_capacity(dtos.len());
    let mut order = Vec::with_capacity(dtos.len());

    for dto in dtos {
        let id = dto.id();
        if by_id.insert(id, dto).is_none() {
            order.push(id);
        }
    }

    (by_id, order)
}
