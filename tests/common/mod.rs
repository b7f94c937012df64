//! Shared helpers for the HTTP and repository integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use aquafarm::server::database::Database;
use aquafarm::server::handlers::AppState;
use aquafarm::server::routes::build_router;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

/// A fresh in-memory SQLite database with the schema in place.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> Arc<Database> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");

    let db = Database::SQLite(pool);
    db.ensure_schema().await.expect("failed to create schema");
    Arc::new(db)
}

/// App state over the SQL repositories plus the router built from it.
pub async fn setup_test_app() -> (AppState, Router) {
    let state = AppState::new(setup_test_db().await);
    let app = build_router(state.clone());
    (state, app)
}

/// Send a request and decode the body as JSON (`{}` for an empty body).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, headers, body)
}

/// Helper to make a JSON request to the app.
pub async fn json_request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body_bytes = body
        .map(|v| serde_json::to_vec(&v).unwrap())
        .unwrap_or_default();

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body_bytes))
        .unwrap();

    let (status, _, body) = send(app, request).await;
    (status, body)
}

/// Helper to make a form-encoded request to the app.
pub async fn form_request(
    app: &Router,
    method: &str,
    uri: &str,
    body: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, _, body) = send(app, request).await;
    (status, body)
}

/// Create a farm through the API and return its id.
pub async fn create_farm(app: &Router, name: &str) -> i64 {
    let (status, body) =
        json_request(app, "POST", "/api/v1/farm", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::OK, "create farm failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

/// Create a pond through the API and return its id.
pub async fn create_pond(app: &Router, name: &str, farm_id: i64) -> i64 {
    let (status, body) = json_request(
        app,
        "POST",
        "/api/v1/pond",
        Some(json!({ "name": name, "farm_id": farm_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create pond failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}
