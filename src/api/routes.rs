//! API Routes
//!
//! Configures the Axum router with all category cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_category_handler, delete_category_handler, get_category_by_slug_handler,
    get_category_by_slug_raw_handler, get_category_handler, get_category_raw_handler,
    health_handler, invalidate_handler, list_categories_handler, stats_handler,
    update_category_handler, update_settings_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/categories/:id",
            get(get_category_handler)
                .put(update_category_handler)
                .delete(delete_category_handler),
        )
        .route("/categories/:id/raw", get(get_category_raw_handler))
        .route("/categories/slug/:slug", get(get_category_by_slug_handler))
        .route(
            "/categories/slug/:slug/raw",
            get(get_category_by_slug_raw_handler),
        )
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/settings", put(update_settings_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
