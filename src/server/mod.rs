// src/server/mod.rs

//! HTTP server components for Aquafarm.
//!
//! This module contains:
//! - `database`    → DB abstraction over SQLite/Postgres plus schema bootstrap
//! - `models`      → Farm, Pond and RecordApi rows and their filters
//! - `repository`  → Repository traits and their SQL implementations
//! - `farm_api`    → Farm CRUD handlers
//! - `pond_api`    → Pond CRUD handlers
//! - `record_api`  → Access-log listing handler
//! - `access_log`  → Middleware counting every request
//! - `fallback`    → 404/405 envelopes and panic recovery
//! - `extract`     → JSON or form body extractor with validation
//! - `logging`     → Request ids, request spans and the health payload
//! - `routes`      → Router builder
//! - `openapi`     → OpenAPI document and Swagger UI (requires `openapi` feature)

pub mod access_log;
pub mod api_error;
pub mod database;
pub mod extract;
pub mod fallback;
pub mod farm_api;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod pond_api;
pub mod record_api;
pub mod repository;
pub mod response;
pub mod routes;
pub mod validation;

#[cfg(feature = "openapi")]
pub mod openapi;

// Convenient re-exports so callers can do `aquafarm::server::X`
// instead of digging into submodules.

pub use api_error::{ApiError, ErrorCode};
pub use database::Database;
pub use handlers::AppState;
pub use models::{
    Farm, FarmSummary, NewFarm, NewPond, Pond, PondSummary, RecordApi, RecordApiKey,
};
pub use repository::{
    FarmRepository, PondRepository, RecordApiRepository, SqlFarmRepository, SqlPondRepository,
    SqlRecordApiRepository,
};
pub use response::Envelope;
pub use routes::build_router;
pub use validation::{ValidationError, ValidationResult};
