//! The uniform response envelope returned by every endpoint.
//!
//! ```json
//! { "message": "success to fetch data", "data": { "id": 1, "name": "Farm 1" } }
//! { "message": "failed to fetch data due to no record found", "errors": "record not found" }
//! ```

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Success/failure wrapper: a human-readable message plus either a payload or an error detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Envelope<T> {
    /// Human-readable outcome
    pub message: String,
    /// Payload, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error detail, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>, errors: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            errors: Some(errors.into()),
        }
    }
}
