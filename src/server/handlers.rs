use std::sync::Arc;

use axum::{extract::State, Json};

use crate::server::api_error::ApiError;
use crate::server::database::Database;
use crate::server::logging::HealthResponse;
use crate::server::repository::{
    FarmRepository, PondRepository, RecordApiRepository, SqlFarmRepository, SqlPondRepository,
    SqlRecordApiRepository,
};

/// Shared application state for handlers and middleware.
///
/// Repositories are trait objects so tests can swap in their own implementations.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub farms: Arc<dyn FarmRepository>,
    pub ponds: Arc<dyn PondRepository>,
    pub records: Arc<dyn RecordApiRepository>,
}

impl AppState {
    /// State backed by the SQL repositories over `db`.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            farms: Arc::new(SqlFarmRepository::new(db.clone())),
            ponds: Arc::new(SqlPondRepository::new(db.clone())),
            records: Arc::new(SqlRecordApiRepository::new(db.clone())),
            db,
        }
    }
}

/// Parse a path id. Anything that is not a positive integer cannot name a row,
/// so it is reported the same way as a missing one.
pub(crate) fn parse_id(raw: &str, not_found_message: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::not_found(not_found_message, "record not found"))
}

/// `GET /api/v1`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1",
    tag = "Meta",
    responses((status = 200, description = "Greeting", body = String))
))]
pub async fn welcome_handler() -> Json<&'static str> {
    Json("Welcome")
}

/// `GET /health`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "Meta",
    responses((status = 200, description = "Service health", body = HealthResponse))
))]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.db.ping().await;
    Json(HealthResponse::new(connected, state.db.db_type()))
}
