//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lookup_cache::{api::create_router, AppState, Config};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::from_config(&Config::default()))
}

/// Parses a JSON body; extractor rejections are plain text and map to Null.
async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == Read Endpoint Tests ==

#[tokio::test]
async fn test_list_categories() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/categories")).await;
    assert_eq!(status, StatusCode::OK);

    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["slug"], "books");
    assert_eq!(list[0]["image"]["src"], "/media/books.jpg");
    // Unpopulated media relation
    assert!(list[1]["image"].is_null());
}

#[tokio::test]
async fn test_get_category_by_id() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/categories/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Science Fiction");
    assert_eq!(json["parent_id"], 1);
}

#[tokio::test]
async fn test_hidden_category_only_visible_raw() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/categories/4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("category 4"));

    let (status, json) = send(&app, get("/categories/4/raw")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hidden"], true);
    assert_eq!(json["description"], "Retired items");
}

#[tokio::test]
async fn test_get_category_by_slug() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/categories/slug/music")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 3);

    let (status, _) = send(&app, get("/categories/slug/archive")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, get("/categories/slug/archive/raw")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 4);
}

// == Write Endpoint Tests ==

#[tokio::test]
async fn test_create_category_visible_through_cache() {
    let app = create_test_app();

    // Warm the cache
    let (_, json) = send(&app, get("/categories")).await;
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (status, created) = send(
        &app,
        with_json("POST", "/categories", r#"{"title":"Tea","slug":"tea"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["id"], 5);

    let (_, json) = send(&app, get("/categories")).await;
    assert_eq!(json.as_array().unwrap().len(), 4);

    let (status, json) = send(&app, get("/categories/slug/tea")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Tea");
}

#[tokio::test]
async fn test_create_category_invalid_body() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        with_json("POST", "/categories", r#"{"title":"","slug":"empty"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_update_category_refreshes_cached_read() {
    let app = create_test_app();

    let (_, json) = send(&app, get("/categories/3")).await;
    assert_eq!(json["title"], "Music");

    let (status, _) = send(
        &app,
        with_json("PUT", "/categories/3", r#"{"title":"Records","slug":"records"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, get("/categories/3")).await;
    assert_eq!(json["title"], "Records");

    let (status, _) = send(&app, get("/categories/slug/music")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_missing_category() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        with_json("PUT", "/categories/77", r#"{"title":"Nope","slug":"nope"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_category() {
    let app = create_test_app();
    send(&app, get("/categories/1")).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/categories/1")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("deleted"));

    let (status, _) = send(&app, get("/categories/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Cache Control Tests ==

#[tokio::test]
async fn test_invalidate_all() {
    let app = create_test_app();
    send(&app, get("/categories")).await;

    let (status, json) = send(&app, with_json("POST", "/cache/invalidate", "{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["id"].is_null());

    let (_, stats) = send(&app, get("/stats")).await;
    assert_eq!(stats["invalidations"], 1);
    assert_eq!(stats["total_entries"], 0);
}

#[tokio::test]
async fn test_settings_switch_to_lazy() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        with_json("PUT", "/settings", r#"{"loading_mode":"lazy","ttl_seconds":30}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["loading_mode"], "lazy");
    assert_eq!(json["ttl_seconds"], 30);

    send(&app, get("/categories/1")).await;
    send(&app, get("/categories/1")).await;

    let (_, stats) = send(&app, get("/stats")).await;
    assert_eq!(stats["loading_mode"], "lazy");
    assert_eq!(stats["store_calls"]["find_by_id"], 1);
    assert_eq!(stats["store_calls"]["find_all"], 0);
    assert_eq!(stats["total_entries"], 1);
}

#[tokio::test]
async fn test_settings_invalid_ttl() {
    let app = create_test_app();

    let (status, _) = send(&app, with_json("PUT", "/settings", r#"{"ttl_seconds":0}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, with_json("PUT", "/settings", r#"{"loading_mode":"sometimes"}"#))
        .await;
    assert!(status.is_client_error());
}

// == Stats / Health Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();
    send(&app, get("/categories/1")).await;
    send(&app, get("/categories/2")).await;

    let (status, json) = send(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["collection"], "categories");
    assert_eq!(json["loading_mode"], "eager");
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 3);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
