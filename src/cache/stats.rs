//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, store loads and invalidations.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::config::LoadingMode;

// == Cache Counters ==
/// Live counters, updated through shared references.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A store load was started.
    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self, loading_mode: LoadingMode, total_entries: usize) -> CacheStats {
        CacheStats {
            loading_mode,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            total_entries,
        }
    }
}

// == Cache Stats ==
/// Cache activity at one point in time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Mode in effect when the stats were taken
    pub loading_mode: LoadingMode,
    /// Reads answered from memory
    pub hits: u64,
    /// Reads that found stale or missing data
    pub misses: u64,
    /// Store loads started
    pub loads: u64,
    /// Store loads that failed
    pub load_failures: u64,
    /// Invalidation calls
    pub invalidations: u64,
    /// Entries currently held for the active mode
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
