//! API Handlers
//!
//! HTTP request handlers for each endpoint. Reads go through the cached
//! category service; writes go to the store and then fire the write hooks.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::catalog::{
    seed_categories, Category, CategoryDto, CategoryMapper, CategoryService, CategoryStore,
    CATEGORIES,
};
use crate::config::{CacheSettings, Config, RuntimeSettings, SettingsUpdate};
use crate::error::{CacheError, Result};
use crate::models::{
    CategoryInput, DeleteResponse, HealthResponse, InvalidateRequest, InvalidateResponse,
    StatsResponse,
};
use crate::service::{InvalidationHooks, ServiceRegistry};
use crate::store::RecordId;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached read API over the category store
    pub categories: Arc<CategoryService>,
    /// Backing store; writes go here directly
    pub store: Arc<CategoryStore>,
    /// Fired after every write
    pub hooks: InvalidationHooks,
    /// Settings the service reads on every call
    pub settings: Arc<RuntimeSettings>,
    pub registry: Arc<ServiceRegistry>,
}

impl AppState {
    /// Creates the state over `store`, with a slug-indexed category service.
    pub fn new(store: Arc<CategoryStore>, settings: Arc<RuntimeSettings>) -> Self {
        let service = CategoryService::with_slug_index(
            Arc::clone(&store),
            CategoryMapper,
            CATEGORIES,
            settings.clone(),
        );
        Self::with_service(store, settings, service)
    }

    /// Creates the state around an already built service.
    ///
    /// The write hooks are created first and find the service through the
    /// registry when they fire.
    pub fn with_service(
        store: Arc<CategoryStore>,
        settings: Arc<RuntimeSettings>,
        service: CategoryService,
    ) -> Self {
        let registry = Arc::new(ServiceRegistry::new());
        let hooks =
            InvalidationHooks::from_registry::<CategoryService>(CATEGORIES, Arc::clone(&registry));
        let categories = registry.get_or_init(|| service);

        Self {
            categories,
            store,
            hooks,
            settings,
            registry,
        }
    }

    /// Creates a new AppState from configuration, seeded with the demo categories.
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(CategoryStore::with_records(seed_categories()));
        let settings = Arc::new(RuntimeSettings::new(config.cache));
        Self::new(store, settings)
    }
}

fn not_found(what: impl std::fmt::Display) -> CacheError {
    CacheError::NotFound(format!("category {}", what))
}

fn owned(dto: Arc<CategoryDto>) -> CategoryDto {
    CategoryDto::clone(&dto)
}

// == Reads ==
/// Handler for GET /categories
pub async fn list_categories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryDto>>> {
    let all = state.categories.get_all().await?;
    Ok(Json(all.into_iter().map(owned).collect()))
}

/// Handler for GET /categories/:id
pub async fn get_category_handler(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<CategoryDto>> {
    let dto = state.categories.get_by_id(id).await?;
    dto.map(|dto| Json(owned(dto))).ok_or_else(|| not_found(id))
}

/// Handler for GET /categories/:id/raw
///
/// Returns the full record, including hidden categories.
pub async fn get_category_raw_handler(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<Category>> {
    let record = state.categories.raw().get_by_id(id).await?;
    record.map(Json).ok_or_else(|| not_found(id))
}

/// Handler for GET /categories/slug/:slug
pub async fn get_category_by_slug_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDto>> {
    let dto = state.categories.get_by_slug_cached(&slug).await?;
    dto.map(|dto| Json(owned(dto)))
        .ok_or_else(|| not_found(format!("'{}'", slug)))
}

/// Handler for GET /categories/slug/:slug/raw
pub async fn get_category_by_slug_raw_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    let record = state.categories.get_by_slug(&slug).await?;
    record
        .map(Json)
        .ok_or_else(|| not_found(format!("'{}'", slug)))
}

// == Writes ==
/// Handler for POST /categories
pub async fn create_category_handler(
    State(state): State<AppState>,
    Json(req): Json<CategoryInput>,
) -> Result<Json<Category>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let created = state.store.create(|id| req.into_category(id)).await;
    state.hooks.after_change(created.id).await?;

    info!(id = created.id, slug = %created.slug, "category created");
    Ok(Json(created))
}

/// Handler for PUT /categories/:id
pub async fn update_category_handler(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(req): Json<CategoryInput>,
) -> Result<Json<Category>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let updated = state.store.update(req.into_category(id)).await?;
    state.hooks.after_change(id).await?;

    info!(id, "category updated");
    Ok(Json(updated))
}

/// Handler for DELETE /categories/:id
pub async fn delete_category_handler(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<DeleteResponse>> {
    state.store.delete(id).await?;
    state.hooks.after_delete(id).await?;

    info!(id, "category deleted");
    Ok(Json(DeleteResponse::new(id)))
}

// == Cache Control ==
/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Json<InvalidateResponse> {
    state.categories.invalidate(req.id).await;
    Json(InvalidateResponse::new(req.id))
}

/// Handler for PUT /settings
///
/// Applies a partial update; the next cache call sees the new values.
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<CacheSettings>> {
    let settings = state.settings.apply(&update)?;
    info!(
        ttl_seconds = settings.ttl_seconds,
        loading_mode = %settings.loading_mode,
        debug = settings.debug,
        "cache settings updated"
    );
    Ok(Json(settings))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.categories.stats().await;
    Json(StatsResponse::new(
        state.categories.collection(),
        stats,
        state.store.calls(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
