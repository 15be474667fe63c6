//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::store::{RecordId, StoreCalls};

/// Response body for DELETE /categories/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The id that was deleted
    pub id: RecordId,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(id: RecordId) -> Self {
        Self {
            message: format!("Category {} deleted successfully", id),
            id,
        }
    }
}

/// Response body for POST /cache/invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub id: Option<RecordId>,
}

impl InvalidateResponse {
    pub fn new(id: Option<RecordId>) -> Self {
        let message = match id {
            Some(id) => format!("Cache invalidated for id {}", id),
            None => "Cache invalidated".to_string(),
        };
        Self { message, id }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Collection the stats belong to
    pub collection: String,
    /// Cache counters
    #[serde(flatten)]
    pub cache: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Calls that reached the record store
    pub store_calls: StoreCalls,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(collection: impl Into<String>, cache: CacheStats, store_calls: StoreCalls) -> Self {
        Self {
            collection: collection.into(),
            hit_rate: cache.hit_rate(),
            cache,
            store_calls,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
