//! Aquafarm - a REST API for farms, ponds and per-route access counters
//!
//! # Features
//!
//! - `sqlite` - SQLite database backend. Enabled by default.
//! - `postgres` - PostgreSQL database backend.
//! - `openapi` - OpenAPI document and Swagger UI.
//!
//! # Example
//!
//! ```toml
//! # Use defaults (sqlite)
//! aquafarm-api = { path = "." }
//!
//! # PostgreSQL instead of SQLite
//! aquafarm-api = { path = ".", default-features = false, features = ["postgres"] }
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one database backend feature: `sqlite` or `postgres`");

pub mod config;
pub mod errors;

#[path = "server/mod.rs"]
pub mod server;
