//! Farm endpoints.
//!
//! # Endpoints
//!
//! - `GET /api/v1/farm` - List farms with their ponds
//! - `GET /api/v1/farm/:farm_id` - Get one farm with its ponds
//! - `POST /api/v1/farm` - Create a farm
//! - `PUT /api/v1/farm` - Create (no id) or update (body id) a farm
//! - `DELETE /api/v1/farm/:farm_id` - Soft-delete a farm and its ponds

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::server::api_error::ApiError;
use crate::server::extract::{optional_id, Payload, PayloadError};
use crate::server::handlers::{parse_id, AppState};
use crate::server::models::{Farm, NewFarm};
use crate::server::response::Envelope;
use crate::server::validation::{
    validate_name, validate_optional_name, validate_upsert_id, Validate, ValidationError,
    ValidationResult,
};

const CREATE_BAD_REQUEST: &str = "failed to add new farm due to bad request";
const CREATE_FAILED: &str = "failed to add new farm due to internal server error";
const CREATE_SUCCESS: &str = "success add new farm instance to database";
const FETCH_FAILED_INTERNAL: &str = "failed to fetch data due to internal server error";
const FETCH_SUCCESS: &str = "success to fetch data";
const FETCH_NOT_FOUND: &str = "failed to fetch data due to no record found";
const FETCH_FAILED: &str = "failed to fetch data";
const UPDATE_BAD_REQUEST: &str = "failed to update new farm due to bad request";
const UPDATE_NOT_FOUND: &str = "failed to fetch data due to no record found with specified id";
const UPDATE_FAILED: &str = "failed to update a farm";
const DELETE_FAILED: &str = "failed to delete a farm";

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /api/v1/farm`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateFarmRequest {
    /// Farm name, 1 to 100 characters
    pub name: String,
}

impl Validate for CreateFarmRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_name(&self.name, "name")
    }
}

impl CreateFarmRequest {
    pub fn into_new_farm(self) -> NewFarm {
        NewFarm { name: self.name }
    }
}

/// Body of `PUT /api/v1/farm`.
///
/// Without an id (or with id 0) this creates a farm and `name` is required.
/// With an id, only the fields present are written onto the stored farm.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateFarmRequest {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Validate for UpdateFarmRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_upsert_id(self.id, "id")?;
        validate_optional_name(self.name.as_deref(), "name")
    }
}

impl UpdateFarmRequest {
    /// The farm to update, `None` when the request creates one.
    pub fn target_id(&self) -> Option<i64> {
        self.id.filter(|id| *id != 0)
    }

    pub fn into_new_farm(self) -> ValidationResult<NewFarm> {
        let name = self
            .name
            .ok_or_else(|| ValidationError::new("name", "is required"))?;
        Ok(NewFarm { name })
    }

    pub fn apply_to(self, farm: &mut Farm) {
        if let Some(name) = self.name {
            farm.name = name;
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a farm.
///
/// `POST /api/v1/farm`
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/farm",
    tag = "farm",
    request_body = CreateFarmRequest,
    responses(
        (status = 200, description = "Farm created", body = Envelope<Farm>),
        (status = 400, description = "Invalid body"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn create_farm_handler(
    State(state): State<AppState>,
    body: Result<Payload<CreateFarmRequest>, PayloadError>,
) -> Result<Json<Envelope<Farm>>, ApiError> {
    let Payload(request) =
        body.map_err(|e| ApiError::bad_request(CREATE_BAD_REQUEST, e.to_string()))?;

    info!(name = %request.name, "Creating farm");

    let farm = state
        .farms
        .create(request.into_new_farm())
        .await
        .map_err(|e| ApiError::database(CREATE_FAILED, e.to_string()))?;

    Ok(Json(Envelope::success(CREATE_SUCCESS, farm)))
}

/// List all farms.
///
/// `GET /api/v1/farm`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/farm",
    tag = "farm",
    responses(
        (status = 200, description = "All farms", body = Envelope<Vec<Farm>>),
        (status = 404, description = "No farms stored"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn list_farms_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Farm>>>, ApiError> {
    let farms = state
        .farms
        .get_all()
        .await
        .map_err(|e| ApiError::database(FETCH_FAILED_INTERNAL, e.to_string()))?;

    if farms.is_empty() {
        return Err(ApiError::no_rows());
    }

    Ok(Json(Envelope::success(FETCH_SUCCESS, farms)))
}

/// Get a farm by id.
///
/// `GET /api/v1/farm/:farm_id`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/farm/{farm_id}",
    tag = "farm",
    params(("farm_id" = i64, Path, description = "Farm id")),
    responses(
        (status = 200, description = "The farm", body = Envelope<Farm>),
        (status = 404, description = "No such farm"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn get_farm_handler(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> Result<Json<Envelope<Farm>>, ApiError> {
    let id = parse_id(&farm_id, FETCH_NOT_FOUND)?;

    let farm = state
        .farms
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_lookup(e, FETCH_NOT_FOUND, FETCH_FAILED))?;

    Ok(Json(Envelope::success(FETCH_SUCCESS, farm)))
}

/// Create or update a farm, decided by the body id.
///
/// `PUT /api/v1/farm`
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/farm",
    tag = "farm",
    request_body = UpdateFarmRequest,
    responses(
        (status = 200, description = "Farm created (no id in body)", body = Envelope<Farm>),
        (status = 204, description = "Farm updated"),
        (status = 400, description = "Invalid body"),
        (status = 404, description = "No farm with that id"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn update_farm_handler(
    State(state): State<AppState>,
    body: Result<Payload<UpdateFarmRequest>, PayloadError>,
) -> Result<Response, ApiError> {
    let Payload(request) =
        body.map_err(|e| ApiError::bad_request(UPDATE_BAD_REQUEST, e.to_string()))?;

    let Some(id) = request.target_id() else {
        let new_farm = request
            .into_new_farm()
            .map_err(|e| ApiError::bad_request(UPDATE_BAD_REQUEST, e.to_string()))?;

        info!(name = %new_farm.name, "Creating farm through update");

        let farm = state
            .farms
            .create(new_farm)
            .await
            .map_err(|e| ApiError::database(CREATE_FAILED, e.to_string()))?;

        return Ok(Json(Envelope::success(CREATE_SUCCESS, farm)).into_response());
    };

    let mut farm = state
        .farms
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_lookup(e, UPDATE_NOT_FOUND, FETCH_FAILED))?;

    request.apply_to(&mut farm);

    state
        .farms
        .update(&farm)
        .await
        .map_err(|e| ApiError::database(UPDATE_FAILED, e.to_string()))?;

    info!(farm_id = id, "Farm updated");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Soft-delete a farm and its ponds.
///
/// `DELETE /api/v1/farm/:farm_id`
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/farm/{farm_id}",
    tag = "farm",
    params(("farm_id" = i64, Path, description = "Farm id")),
    responses(
        (status = 204, description = "Farm deleted"),
        (status = 404, description = "No such farm"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn delete_farm_handler(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&farm_id, FETCH_NOT_FOUND)?;

    let farm = state
        .farms
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_lookup(e, FETCH_NOT_FOUND, DELETE_FAILED))?;

    state
        .farms
        .delete(&farm)
        .await
        .map_err(|e| ApiError::database(DELETE_FAILED, e.to_string()))?;

    info!(farm_id = id, ponds = farm.ponds.len(), "Farm deleted");
    Ok(StatusCode::NO_CONTENT)
}
