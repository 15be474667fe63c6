//! Error types for the lookup cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::store::StoreError;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
///
/// `Clone` because a single failed load is handed to every caller that
/// attached to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Record absent or rejected by the mapper
    #[error("Not found: {0}")]
    NotFound(String),

    /// The record store call itself failed
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// A service was used before the application wired it up
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Invalid request or configuration input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CacheError::NotFound(format!("record {}", id)),
            other => CacheError::StoreFailure(other.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::StoreFailure(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            CacheError::ConfigurationMissing(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            CacheError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
