//! How the handlers answer when a repository fails or panics.

#![cfg(feature = "sqlite")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use aquafarm::errors::{AppError, AppResult};
use aquafarm::server::models::{
    Farm, FarmFilter, NewFarm, RecordApi, RecordApiFilter, RecordApiKey,
};
use aquafarm::server::repository::{FarmRepository, RecordApiRepository};
use aquafarm::server::AppState;
use async_trait::async_trait;
use axum::{http::StatusCode, Router};
use chrono::NaiveDate;
use common::{json_request, setup_test_db};
use serde_json::json;

fn db_down() -> AppError {
    AppError::Database("connection refused".to_string())
}

fn stored_farm(id: i64) -> Farm {
    let at = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    Farm {
        id,
        name: "Stored".to_string(),
        ponds: Vec::new(),
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}

/// How a substitute farm repository behaves.
#[derive(Clone, Copy)]
enum Mode {
    /// Every call fails with a database error.
    Down,
    /// Lookups find a farm, writes fail.
    ReadOnly,
    /// Every call panics.
    Panics,
}

struct FakeFarms(Mode);

impl FakeFarms {
    fn read(&self) -> AppResult<Farm> {
        match self.0 {
            Mode::Down => Err(db_down()),
            Mode::ReadOnly => Ok(stored_farm(1)),
            Mode::Panics => panic!("farm repository exploded"),
        }
    }

    fn write(&self) -> AppResult<()> {
        match self.0 {
            Mode::Down | Mode::ReadOnly => Err(db_down()),
            Mode::Panics => panic!("farm repository exploded"),
        }
    }
}

#[async_trait]
impl FarmRepository for FakeFarms {
    async fn create(&self, _new: NewFarm) -> AppResult<Farm> {
        self.write()?;
        self.read()
    }

    async fn get_all(&self) -> AppResult<Vec<Farm>> {
        self.read().map(|farm| vec![farm])
    }

    async fn get_by_id(&self, _id: i64) -> AppResult<Farm> {
        self.read()
    }

    async fn get_by_model(&self, _filter: &FarmFilter) -> AppResult<Farm> {
        self.read()
    }

    async fn update(&self, _farm: &Farm) -> AppResult<()> {
        self.write()
    }

    async fn delete(&self, _farm: &Farm) -> AppResult<()> {
        self.write()
    }
}

struct DownRecords;

#[async_trait]
impl RecordApiRepository for DownRecords {
    async fn create(&self, _key: &RecordApiKey) -> AppResult<RecordApi> {
        Err(db_down())
    }

    async fn get_all(&self) -> AppResult<Vec<RecordApi>> {
        Err(db_down())
    }

    async fn get_by_model(&self, _filter: &RecordApiFilter) -> AppResult<RecordApi> {
        Err(db_down())
    }

    async fn update_count(&self, _record: &mut RecordApi) -> AppResult<()> {
        Err(db_down())
    }
}

/// Never finishes a write.
struct StalledRecords;

#[async_trait]
impl RecordApiRepository for StalledRecords {
    async fn create(&self, _key: &RecordApiKey) -> AppResult<RecordApi> {
        std::future::pending().await
    }

    async fn get_all(&self) -> AppResult<Vec<RecordApi>> {
        Ok(Vec::new())
    }

    async fn get_by_model(&self, _filter: &RecordApiFilter) -> AppResult<RecordApi> {
        std::future::pending().await
    }

    async fn update_count(&self, _record: &mut RecordApi) -> AppResult<()> {
        std::future::pending().await
    }
}

async fn app_with_farms(mode: Mode) -> Router {
    let mut state = AppState::new(setup_test_db().await);
    state.farms = Arc::new(FakeFarms(mode));
    aquafarm::server::build_router(state)
}

#[tokio::test]
async fn list_failure_is_internal_error() {
    let app = app_with_farms(Mode::Down).await;

    let (status, body) = json_request(&app, "GET", "/api/v1/farm", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "failed to fetch data due to internal server error"
    );
    assert_eq!(body["errors"], "database error: connection refused");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn create_failure_is_internal_error() {
    let app = app_with_farms(Mode::Down).await;

    let (status, body) =
        json_request(&app, "POST", "/api/v1/farm", Some(json!({ "name": "X" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "failed to add new farm due to internal server error"
    );
}

#[tokio::test]
async fn get_failure_is_internal_error() {
    let app = app_with_farms(Mode::Down).await;

    let (status, body) = json_request(&app, "GET", "/api/v1/farm/1", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "failed to fetch data");
}

#[tokio::test]
async fn delete_lookup_failure_is_internal_error() {
    let app = app_with_farms(Mode::Down).await;

    let (status, body) = json_request(&app, "DELETE", "/api/v1/farm/1", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "failed to delete a farm");
}

#[tokio::test]
async fn update_write_failure_is_internal_error() {
    let app = app_with_farms(Mode::ReadOnly).await;

    let (status, body) = json_request(
        &app,
        "PUT",
        "/api/v1/farm",
        Some(json!({ "id": 1, "name": "Renamed" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "failed to update a farm");
}

#[tokio::test]
async fn delete_write_failure_is_internal_error() {
    let app = app_with_farms(Mode::ReadOnly).await;

    let (status, body) = json_request(&app, "DELETE", "/api/v1/farm/1", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "failed to delete a farm");
}

#[tokio::test]
async fn panic_becomes_internal_error_envelope() {
    let app = app_with_farms(Mode::Panics).await;

    let (status, body) = json_request(&app, "GET", "/api/v1/farm", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "internal server error");

    // The server keeps answering after a panic.
    let (status, _) = json_request(&app, "GET", "/api/v1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn access_log_failure_does_not_change_response() {
    let mut state = AppState::new(setup_test_db().await);
    state.records = Arc::new(DownRecords);
    let app = aquafarm::server::build_router(state);

    let (status, body) =
        json_request(&app, "POST", "/api/v1/farm", Some(json!({ "name": "Kept" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Kept");

    let (status, body) = json_request(&app, "GET", "/api/v1/record", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "failed to fetch data due to internal server error"
    );
}

#[tokio::test]
async fn stalled_access_log_does_not_hold_response() {
    let mut state = AppState::new(setup_test_db().await);
    state.records = Arc::new(StalledRecords);
    let app = aquafarm::server::build_router(state);

    let (status, body) = tokio::time::timeout(
        Duration::from_secs(5),
        json_request(&app, "GET", "/api/v1", None),
    )
    .await
    .expect("response waited on the access log");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Welcome"));
}
