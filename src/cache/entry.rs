//! Cache Entry Module
//!
//! A single lazily loaded DTO with its own expiry.

use std::sync::Arc;

// == Cache Entry ==
/// One per-id entry of a lazy cache.
///
/// Entries are replaced wholesale on reload, never updated in place.
#[derive(Debug)]
pub struct CacheEntry<D> {
    /// The stored DTO
    pub dto: Arc<D>,
    /// Load timestamp (Unix milliseconds)
    pub loaded_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<D> CacheEntry<D> {
    // == Constructor ==
    /// Creates an entry loaded at `now_ms` that lives for `ttl_ms`.
    pub fn new(dto: Arc<D>, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            dto,
            loaded_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry stays valid up to and including `expires_at`; it is expired
    /// once the clock has moved past it.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

impl<D> Clone for CacheEntry<D> {
    fn clone(&self) -> Self {
        Self {
            dto: Arc::clone(&self.dto),
            loaded_at: self.loaded_at,
            expires_at: self.expires_at,
        }
    }
}
