//! OpenAPI documentation for the Aquafarm API.
//!
//! This module provides OpenAPI 3.0 specification generation using utoipa,
//! along with Swagger UI for interactive API exploration.
//!
//! With the `openapi` feature enabled, [`build_router`](crate::server::routes::build_router)
//! serves Swagger UI at `/swagger-ui` and the document at `/api-docs/openapi.json`.

use utoipa::OpenApi;

/// OpenAPI documentation for every Aquafarm endpoint.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Aquafarm API",
        version = "1.0.0",
        description = "CRUD API for farms and ponds with per-route access counters.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "farm", description = "Farm management"),
        (name = "pond", description = "Pond management"),
        (name = "record", description = "Access-log counters"),
        (name = "Meta", description = "Welcome and health endpoints")
    ),
    paths(
        crate::server::handlers::welcome_handler,
        crate::server::handlers::health_handler,
        // Farms
        crate::server::farm_api::list_farms_handler,
        crate::server::farm_api::get_farm_handler,
        crate::server::farm_api::create_farm_handler,
        crate::server::farm_api::update_farm_handler,
        crate::server::farm_api::delete_farm_handler,
        // Ponds
        crate::server::pond_api::list_ponds_handler,
        crate::server::pond_api::get_pond_handler,
        crate::server::pond_api::create_pond_handler,
        crate::server::pond_api::update_pond_handler,
        crate::server::pond_api::delete_pond_handler,
        // Access log
        crate::server::record_api::list_records_handler,
    ),
    components(
        schemas(
            crate::server::models::Farm,
            crate::server::models::Pond,
            crate::server::models::FarmSummary,
            crate::server::models::PondSummary,
            crate::server::models::RecordApi,
            crate::server::farm_api::CreateFarmRequest,
            crate::server::farm_api::UpdateFarmRequest,
            crate::server::pond_api::CreatePondRequest,
            crate::server::pond_api::UpdatePondRequest,
            crate::server::logging::HealthResponse,
            crate::server::logging::DatabaseHealth,
        )
    )
)]
pub struct ApiDoc;

/// The OpenAPI document served at `/api-docs/openapi.json`.
pub fn get_openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
