//! Access-log middleware: counts requests per path, client, status and referer.
//!
//! The counter is written once the inner service has produced its response,
//! so the stored status is the one the client actually received. The write
//! runs on its own task and never holds up the response; a failed write is
//! logged and otherwise ignored.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::REFERER,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::server::handlers::AppState;
use crate::server::models::RecordApiKey;

/// Extract the client identifier from the request.
///
/// Checks in order:
/// 1. `X-Forwarded-For` header
/// 2. `X-Real-IP` header
/// 3. Connection info (if available)
///
/// When the chosen value is a comma separated list, only its first entry is
/// kept. Returns an empty string when none of the sources is present.
pub fn extract_client_ip<B>(req: &Request<B>) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let requester = header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_default();

    match requester.split_once(',') {
        Some((first, _)) => first.trim().to_string(),
        None => requester,
    }
}

/// Build the access-log key for a request; the status is filled in later.
fn visit_key<B>(req: &Request<B>) -> RecordApiKey {
    let request_path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let referer = req
        .headers()
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    RecordApiKey {
        request_path,
        client_ip: extract_client_ip(req),
        status: 0,
        referer,
    }
}

/// Count the request in `record_apis` once the response is known.
pub async fn record_api_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut key = visit_key(&request);

    let response = next.run(request).await;
    key.status = i32::from(response.status().as_u16());

    let records = state.records.clone();
    tokio::spawn(async move {
        match records.record_visit(&key).await {
            Ok(record) => debug!(
                path = %record.request_path,
                status = record.status,
                count = record.count,
                "Recorded API access"
            ),
            Err(e) => warn!(
                path = %key.request_path,
                status = key.status,
                "Failed to record API access: {e}"
            ),
        }
    });

    response
}
