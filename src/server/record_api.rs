//! Read-only listing of the access-log counters.

use axum::{extract::State, Json};

use crate::server::api_error::ApiError;
use crate::server::handlers::AppState;
use crate::server::models::RecordApi;
use crate::server::response::Envelope;

/// List every access-log counter, ordered by request path.
///
/// `GET /api/v1/record`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/record",
    tag = "record",
    responses(
        (status = 200, description = "All access-log rows", body = Envelope<Vec<RecordApi>>),
        (status = 404, description = "No rows stored"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn list_records_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<RecordApi>>>, ApiError> {
    let records = state.records.get_all().await.map_err(|e| {
        ApiError::database(
            "failed to fetch data due to internal server error",
            e.to_string(),
        )
    })?;

    if records.is_empty() {
        return Err(ApiError::no_rows());
    }

    Ok(Json(Envelope::success("success to fetch data", records)))
}
