//! Pond endpoints.
//!
//! # Endpoints
//!
//! - `GET /api/v1/pond` - List ponds with their farm
//! - `GET /api/v1/pond/:pond_id` - Get one pond with its farm
//! - `POST /api/v1/pond` - Create a pond under an existing farm
//! - `PUT /api/v1/pond` - Create (no id) or update (body id) a pond
//! - `DELETE /api/v1/pond/:pond_id` - Soft-delete a pond

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::server::api_error::ApiError;
use crate::server::extract::{optional_id, Payload, PayloadError};
use crate::server::handlers::{parse_id, AppState};
use crate::server::models::{FarmFilter, NewPond, Pond};
use crate::server::response::Envelope;
use crate::server::validation::{
    validate_name, validate_optional_name, validate_reference_id, validate_upsert_id, Validate,
    ValidationError, ValidationResult,
};

const CREATE_BAD_REQUEST: &str = "failed to add new pond due to bad request";
const CREATE_FAILED: &str = "failed to add new pond due to internal server error";
const CREATE_SUCCESS: &str = "success add new pond instance to database";
const FETCH_FAILED_INTERNAL: &str = "failed to fetch data due to internal server error";
const FETCH_SUCCESS: &str = "success to fetch data";
const FETCH_NOT_FOUND: &str = "failed to fetch data due to no record found";
const FETCH_FAILED: &str = "failed to fetch data";
const UPDATE_BAD_REQUEST: &str = "failed to update new pond due to bad request";
const UPDATE_NOT_FOUND: &str = "failed to fetch data due to no record found with specified id";
const UPDATE_FAILED: &str = "failed to update a pond";
const DELETE_FAILED: &str = "failed to delete a pond";

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /api/v1/pond`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePondRequest {
    /// Pond name, 1 to 100 characters
    pub name: String,
    /// Id of the farm the pond belongs to
    pub farm_id: i64,
}

impl Validate for CreatePondRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_name(&self.name, "name")?;
        validate_reference_id(self.farm_id, "farm_id")
    }
}

impl CreatePondRequest {
    pub fn into_new_pond(self) -> NewPond {
        NewPond {
            name: self.name,
            farm_id: self.farm_id,
        }
    }
}

/// Body of `PUT /api/v1/pond`.
///
/// Without an id (or with id 0) this creates a pond and both `name` and
/// `farm_id` are required. With an id, only the fields present are written.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdatePondRequest {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub farm_id: Option<i64>,
}

impl Validate for UpdatePondRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_upsert_id(self.id, "id")?;
        validate_optional_name(self.name.as_deref(), "name")?;
        match self.farm_id {
            Some(farm_id) => validate_reference_id(farm_id, "farm_id"),
            None => Ok(()),
        }
    }
}

impl UpdatePondRequest {
    /// The pond to update, `None` when the request creates one.
    pub fn target_id(&self) -> Option<i64> {
        self.id.filter(|id| *id != 0)
    }

    pub fn into_new_pond(self) -> ValidationResult<NewPond> {
        let name = self
            .name
            .ok_or_else(|| ValidationError::new("name", "is required"))?;
        let farm_id = self
            .farm_id
            .ok_or_else(|| ValidationError::new("farm_id", "is required"))?;
        Ok(NewPond { name, farm_id })
    }

    pub fn apply_to(self, pond: &mut Pond) {
        if let Some(name) = self.name {
            pond.name = name;
        }
        if let Some(farm_id) = self.farm_id {
            if farm_id != pond.farm_id {
                pond.farm_id = farm_id;
                pond.farm = None;
            }
        }
    }
}

/// A pond may only point at a live farm. A missing farm is the caller's fault (400).
async fn ensure_farm_exists(
    state: &AppState,
    farm_id: i64,
    bad_request_message: &str,
    failure_message: &str,
) -> Result<(), ApiError> {
    let filter = FarmFilter {
        id: Some(farm_id),
        ..FarmFilter::default()
    };

    match state.farms.get_by_model(&filter).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            warn!(farm_id, "Pond references unknown farm");
            Err(ApiError::bad_request(
                bad_request_message,
                format!("farm_id: farm {farm_id} does not exist"),
            ))
        }
        Err(e) => Err(ApiError::database(failure_message, e.to_string())),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a pond.
///
/// `POST /api/v1/pond`
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/pond",
    tag = "pond",
    request_body = CreatePondRequest,
    responses(
        (status = 200, description = "Pond created", body = Envelope<Pond>),
        (status = 400, description = "Invalid body or unknown farm"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn create_pond_handler(
    State(state): State<AppState>,
    body: Result<Payload<CreatePondRequest>, PayloadError>,
) -> Result<Json<Envelope<Pond>>, ApiError> {
    let Payload(request) =
        body.map_err(|e| ApiError::bad_request(CREATE_BAD_REQUEST, e.to_string()))?;

    ensure_farm_exists(&state, request.farm_id, CREATE_BAD_REQUEST, CREATE_FAILED).await?;

    info!(name = %request.name, farm_id = request.farm_id, "Creating pond");

    let pond = state
        .ponds
        .create(request.into_new_pond())
        .await
        .map_err(|e| ApiError::database(CREATE_FAILED, e.to_string()))?;

    Ok(Json(Envelope::success(CREATE_SUCCESS, pond)))
}

/// List all ponds.
///
/// `GET /api/v1/pond`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/pond",
    tag = "pond",
    responses(
        (status = 200, description = "All ponds", body = Envelope<Vec<Pond>>),
        (status = 404, description = "No ponds stored"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn list_ponds_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Pond>>>, ApiError> {
    let ponds = state
        .ponds
        .get_all()
        .await
        .map_err(|e| ApiError::database(FETCH_FAILED_INTERNAL, e.to_string()))?;

    if ponds.is_empty() {
        return Err(ApiError::no_rows());
    }

    Ok(Json(Envelope::success(FETCH_SUCCESS, ponds)))
}

/// Get a pond by id.
///
/// `GET /api/v1/pond/:pond_id`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/pond/{pond_id}",
    tag = "pond",
    params(("pond_id" = i64, Path, description = "Pond id")),
    responses(
        (status = 200, description = "The pond", body = Envelope<Pond>),
        (status = 404, description = "No such pond"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn get_pond_handler(
    State(state): State<AppState>,
    Path(pond_id): Path<String>,
) -> Result<Json<Envelope<Pond>>, ApiError> {
    let id = parse_id(&pond_id, FETCH_NOT_FOUND)?;

    let pond = state
        .ponds
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_lookup(e, FETCH_NOT_FOUND, FETCH_FAILED))?;

    Ok(Json(Envelope::success(FETCH_SUCCESS, pond)))
}

/// Create or update a pond, decided by the body id.
///
/// `PUT /api/v1/pond`
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/pond",
    tag = "pond",
    request_body = UpdatePondRequest,
    responses(
        (status = 200, description = "Pond created (no id in body)", body = Envelope<Pond>),
        (status = 204, description = "Pond updated"),
        (status = 400, description = "Invalid body or unknown farm"),
        (status = 404, description = "No pond with that id"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn update_pond_handler(
    State(state): State<AppState>,
    body: Result<Payload<UpdatePondRequest>, PayloadError>,
) -> Result<Response, ApiError> {
    let Payload(request) =
        body.map_err(|e| ApiError::bad_request(UPDATE_BAD_REQUEST, e.to_string()))?;

    let Some(id) = request.target_id() else {
        let new_pond = request
            .into_new_pond()
            .map_err(|e| ApiError::bad_request(UPDATE_BAD_REQUEST, e.to_string()))?;

        ensure_farm_exists(&state, new_pond.farm_id, UPDATE_BAD_REQUEST, CREATE_FAILED).await?;

        info!(name = %new_pond.name, farm_id = new_pond.farm_id, "Creating pond through update");

        let pond = state
            .ponds
            .create(new_pond)
            .await
            .map_err(|e| ApiError::database(CREATE_FAILED, e.to_string()))?;

        return Ok(Json(Envelope::success(CREATE_SUCCESS, pond)).into_response());
    };

    let mut pond = state
        .ponds
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_lookup(e, UPDATE_NOT_FOUND, FETCH_FAILED))?;

    if let Some(farm_id) = request.farm_id.filter(|farm_id| *farm_id != pond.farm_id) {
        ensure_farm_exists(&state, farm_id, UPDATE_BAD_REQUEST, UPDATE_FAILED).await?;
    }

    request.apply_to(&mut pond);

    state
        .ponds
        .update(&pond)
        .await
        .map_err(|e| ApiError::database(UPDATE_FAILED, e.to_string()))?;

    info!(pond_id = id, "Pond updated");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Soft-delete a pond.
///
/// `DELETE /api/v1/pond/:pond_id`
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/pond/{pond_id}",
    tag = "pond",
    params(("pond_id" = i64, Path, description = "Pond id")),
    responses(
        (status = 204, description = "Pond deleted"),
        (status = 404, description = "No such pond"),
        (status = 500, description = "Database failure")
    )
))]
pub async fn delete_pond_handler(
    State(state): State<AppState>,
    Path(pond_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&pond_id, FETCH_NOT_FOUND)?;

    let pond = state
        .ponds
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::from_lookup(e, FETCH_NOT_FOUND, DELETE_FAILED))?;

    state
        .ponds
        .delete(&pond)
        .await
        .map_err(|e| ApiError::database(DELETE_FAILED, e.to_string()))?;

    info!(pond_id = id, "Pond deleted");
    Ok(StatusCode::NO_CONTENT)
}
