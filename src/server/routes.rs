use axum::{middleware, routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::server::access_log::record_api_middleware;
use crate::server::farm_api::{
    create_farm_handler, delete_farm_handler, get_farm_handler, list_farms_handler,
    update_farm_handler,
};
use crate::server::fallback::{
    method_not_allowed_middleware, panic_response, route_not_found_handler,
};
use crate::server::handlers::{health_handler, welcome_handler, AppState};
use crate::server::logging::request_logging_middleware;
use crate::server::pond_api::{
    create_pond_handler, delete_pond_handler, get_pond_handler, list_ponds_handler,
    update_pond_handler,
};
use crate::server::record_api::list_records_handler;

/// Build the main application router for the Aquafarm server.
///
/// This is a convenience helper so `main.rs` or tests can
/// construct the router in a single call.
///
/// # Routes
///
/// - `GET /health` - Service and database health
/// - `GET /api/v1` - Welcome message
///
/// ## Farms
/// - `GET /api/v1/farm` - List farms
/// - `GET /api/v1/farm/:farm_id` - Get a farm
/// - `POST /api/v1/farm` - Create a farm
/// - `PUT /api/v1/farm` - Create or update a farm (by body id)
/// - `DELETE /api/v1/farm/:farm_id` - Soft-delete a farm and its ponds
///
/// ## Ponds
/// - `GET /api/v1/pond` - List ponds
/// - `GET /api/v1/pond/:pond_id` - Get a pond
/// - `POST /api/v1/pond` - Create a pond
/// - `PUT /api/v1/pond` - Create or update a pond (by body id)
/// - `DELETE /api/v1/pond/:pond_id` - Soft-delete a pond
///
/// ## Access log
/// - `GET /api/v1/record` - List access-log counters
///
/// # Middleware (outermost first)
///
/// request logging, CORS, access log, panic recovery, 405 envelope.
/// Unknown paths get the "route not found" envelope.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1", get(welcome_handler))
        // Farms
        .route(
            "/api/v1/farm",
            get(list_farms_handler)
                .post(create_farm_handler)
                .put(update_farm_handler),
        )
        .route(
            "/api/v1/farm/:farm_id",
            get(get_farm_handler).delete(delete_farm_handler),
        )
        // Ponds
        .route(
            "/api/v1/pond",
            get(list_ponds_handler)
                .post(create_pond_handler)
                .put(update_pond_handler),
        )
        .route(
            "/api/v1/pond/:pond_id",
            get(get_pond_handler).delete(delete_pond_handler),
        )
        // Access log
        .route("/api/v1/record", get(list_records_handler))
        .fallback(route_not_found_handler);

    #[cfg(feature = "openapi")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", crate::server::openapi::get_openapi()),
    );

    router
        .layer(middleware::from_fn(method_not_allowed_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            record_api_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
