//! Standardized API error responses for all Aquafarm endpoints.
//!
//! Every failure is rendered as the failure [`Envelope`]: the handler picks the
//! message, the underlying error supplies the `errors` detail, and the
//! [`ErrorCode`] decides the HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::errors::AppError;
use crate::server::response::Envelope;

/// Failure categories and their HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request payload is malformed or violates a field constraint
    InvalidRequest,
    /// No matching row, empty collection, or unknown route
    NotFound,
    /// Route exists but not for this method
    MethodNotAllowed,
    /// Database operation failed
    DatabaseError,
    /// Unexpected internal server error
    InternalError,
}

impl ErrorCode {
    /// Returns the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// An error ready to be written as a failure envelope.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub errors: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>, errors: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: errors.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>, errors: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message, errors)
    }

    pub fn not_found(message: impl Into<String>, errors: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message, errors)
    }

    pub fn database(message: impl Into<String>, errors: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message, errors)
    }

    pub fn internal(message: impl Into<String>, errors: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message, errors)
    }

    /// The "zero rows" failure shared by every list endpoint.
    pub fn no_rows() -> Self {
        Self::not_found("failed to fetch data due to no data row found", "no record found")
    }

    /// Map a repository error: `NotFound` becomes a 404 with `not_found_message`,
    /// anything else a 500 with `failure_message`.
    pub fn from_lookup(err: AppError, not_found_message: &str, failure_message: &str) -> Self {
        if err.is_not_found() {
            Self::not_found(not_found_message, err.to_string())
        } else {
            Self::database(failure_message, err.to_string())
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = ?self.code, errors = %self.errors, "{}", self.message);
        }
        (status, Json(Envelope::failure(self.message, self.errors))).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.message, self.errors)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(
            ErrorCode::InvalidRequest.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ErrorCode::DatabaseError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn lookup_not_found_maps_to_404() {
        let err = ApiError::from_lookup(AppError::NotFound, "missing", "failed");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "missing");
        assert_eq!(err.errors, "record not found");
    }

    #[test]
    fn lookup_database_error_maps_to_500() {
        let err = ApiError::from_lookup(
            AppError::Database("connection reset".to_string()),
            "missing",
            "failed",
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "failed");
        assert!(err.errors.contains("connection reset"));
    }

    #[test]
    fn no_rows_uses_fixed_detail() {
        let err = ApiError::no_rows();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.errors, "no record found");
    }

    #[test]
    fn into_response_carries_status() {
        let response = ApiError::bad_request("bad", "name: cannot be empty").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
