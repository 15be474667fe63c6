//! API Module
//!
//! HTTP handlers and routing for the category cache server.
//!
//! # Endpoints
//! - `GET /categories` - All categories (cached)
//! - `GET /categories/:id` - One category by id (cached)
//! - `GET /categories/:id/raw` - Full record, bypassing the cache
//! - `GET /categories/slug/:slug` - One category by slug (cached)
//! - `GET /categories/slug/:slug/raw` - Full record by slug, bypassing the cache
//! - `POST /categories`, `PUT /categories/:id`, `DELETE /categories/:id` - Writes
//! - `POST /cache/invalidate` - Drop cached state
//! - `PUT /settings` - Change cache settings at runtime
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
