//! Lookup Cache - a read-mostly cache for store-backed collections
//!
//! Serves mapped DTOs for a collection from memory, loading eagerly (the
//! whole collection at once) or lazily (one record at a time), with TTL
//! expiry, single-flight loads and explicit invalidation from write hooks.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod service;
pub mod store;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use service::{CachedCollectionService, InvalidationHooks, ServiceRegistry};
