//! Integration tests for the access-log middleware and `GET /api/v1/record`.

#![cfg(feature = "sqlite")]

mod common;

use std::time::Duration;

use aquafarm::server::models::RecordApi;
use aquafarm::server::AppState;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{create_farm, json_request, send, setup_test_app};
use tower::ServiceExt;

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

/// Access-log rows once at least `visits` requests have been counted.
///
/// Counters are written in the background after each response, so poll.
async fn records(state: &AppState, visits: i64) -> Vec<RecordApi> {
    for _ in 0..200 {
        let rows = state.records.get_all().await.unwrap();
        if rows.iter().map(|r| r.count).sum::<i64>() >= visits {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("access log never reached {visits} visits");
}

fn find<'a>(rows: &'a [RecordApi], path: &str, status: i32) -> Option<&'a RecordApi> {
    rows.iter()
        .find(|r| r.request_path == path && r.status == status)
}

#[tokio::test]
async fn repeated_requests_increment_one_row() {
    let (state, app) = setup_test_app().await;

    for _ in 0..3 {
        let request = get("/api/v1")
            .header("x-forwarded-for", "198.51.100.4")
            .body(Body::empty())
            .unwrap();
        send(&app, request).await;
    }

    let rows = records(&state, 3).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].request_path, "/api/v1");
    assert_eq!(rows[0].client_ip, "198.51.100.4");
    assert_eq!(rows[0].status, 200);
    assert_eq!(rows[0].referer, "");
    assert_eq!(rows[0].count, 3);
}

#[tokio::test]
async fn final_status_is_recorded() {
    let (state, app) = setup_test_app().await;

    // Empty collection answers 404, then 200 once a farm exists.
    json_request(&app, "GET", "/api/v1/farm", None).await;
    create_farm(&app, "Alpha").await;
    json_request(&app, "GET", "/api/v1/farm", None).await;

    let rows = records(&state, 3).await;
    assert_eq!(find(&rows, "/api/v1/farm", 404).unwrap().count, 1);
    assert_eq!(find(&rows, "/api/v1/farm", 200).unwrap().count, 2);
}

#[tokio::test]
async fn forwarded_for_list_uses_first_entry() {
    let (state, app) = setup_test_app().await;

    let request = get("/api/v1")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1, 10.0.0.2")
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    let rows = records(&state, 1).await;
    assert_eq!(rows[0].client_ip, "203.0.113.9");
}

#[tokio::test]
async fn real_ip_used_without_forwarded_for() {
    let (state, app) = setup_test_app().await;

    let request = get("/api/v1")
        .header("x-real-ip", "192.0.2.44")
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    let rows = records(&state, 1).await;
    assert_eq!(rows[0].client_ip, "192.0.2.44");
}

#[tokio::test]
async fn query_string_and_referer_are_part_of_the_key() {
    let (state, app) = setup_test_app().await;

    let with_referer = get("/api/v1?source=test")
        .header("referer", "https://example.org/dashboard")
        .body(Body::empty())
        .unwrap();
    send(&app, with_referer).await;
    send(&app, get("/api/v1?source=test").body(Body::empty()).unwrap()).await;

    let rows = records(&state, 2).await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.request_path == "/api/v1?source=test"));
    assert!(rows
        .iter()
        .any(|r| r.referer == "https://example.org/dashboard" && r.count == 1));
    assert!(rows.iter().any(|r| r.referer.is_empty() && r.count == 1));
}

#[tokio::test]
async fn unknown_routes_are_recorded_too() {
    let (state, app) = setup_test_app().await;

    json_request(&app, "GET", "/nowhere", None).await;

    let rows = records(&state, 1).await;
    assert_eq!(find(&rows, "/nowhere", 404).unwrap().count, 1);
}

#[tokio::test]
async fn concurrent_identical_requests_share_one_row() {
    let (state, app) = setup_test_app().await;
    let requests: i64 = 20;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..requests {
        let app: Router = app.clone();
        tasks.spawn(async move {
            let request = get("/api/v1")
                .header("x-forwarded-for", "10.1.1.1")
                .body(Body::empty())
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        });
    }
    while let Some(status) = tasks.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let rows = records(&state, requests).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].count, requests);
}

#[tokio::test]
async fn record_listing_is_not_found_when_empty() {
    let (state, app) = setup_test_app().await;

    let (status, body) = json_request(&app, "GET", "/api/v1/record", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"], "no record found");

    // The listing request itself is counted after it answers.
    let rows = records(&state, 1).await;
    assert_eq!(find(&rows, "/api/v1/record", 404).unwrap().count, 1);
}

#[tokio::test]
async fn record_listing_orders_by_path() {
    let (state, app) = setup_test_app().await;

    json_request(&app, "GET", "/api/v1/pond", None).await;
    json_request(&app, "GET", "/api/v1/farm", None).await;
    records(&state, 2).await;

    let (status, body) = json_request(&app, "GET", "/api/v1/record", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "success to fetch data");
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["request_path"], "/api/v1/farm");
    assert_eq!(rows[1]["request_path"], "/api/v1/pond");
    assert_eq!(rows[0]["status"], 404);
    assert_eq!(rows[0]["count"], 1);
    assert!(rows[0].get("created_at").is_none());
}
