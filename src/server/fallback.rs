//! Envelopes for requests no handler accepted, and for handler panics.

use std::any::Any;

use axum::{
    extract::Request,
    http::{header::ALLOW, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::server::api_error::{ApiError, ErrorCode};

/// Router fallback for paths that match no route.
pub async fn route_not_found_handler(uri: Uri) -> ApiError {
    ApiError::not_found("route not found", format!("no route for {}", uri.path()))
}

/// Replace the empty 405 the router produces for a known path with the
/// method-not-allowed envelope, keeping its `Allow` header.
pub async fn method_not_allowed_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut replacement = ApiError::new(
        ErrorCode::MethodNotAllowed,
        "method not allowed",
        format!("{method} is not supported on {path}"),
    )
    .into_response();

    if let Some(allow) = allow {
        replacement.headers_mut().insert(ALLOW, allow);
    }
    replacement
}

/// Turn a caught handler panic into the internal-error envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Handler panicked");
    ApiError::internal("internal server error", detail).into_response()
}
