//! Job lookups through the router with a mock PostgREST job table.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use vtx_api::{create_router, ApiConfig, AppState};
use vtx_jobstore::{PostgrestClient, PostgrestConfig};
use vtx_storage::MemoryObjectStore;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn router(server: &MockServer) -> Router {
    let jobs = PostgrestClient::new(PostgrestConfig::new(server.uri(), "service-key")).unwrap();
    let state = AppState::new(
        ApiConfig::default(),
        Arc::new(jobs),
        Arc::new(MemoryObjectStore::new()),
        "videos",
    )
    .unwrap();
    create_router(state, None)
}

async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// PostgREST answers a non-uuid filter on a uuid column with 400 / 22P02.
async fn mount_invalid_uuid(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.nope"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "22P02",
            "details": null,
            "hint": null,
            "message": "invalid input syntax for type uuid: \"nope\""
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rejected_id_is_not_found() {
    let server = MockServer::start().await;
    mount_invalid_uuid(&server).await;

    let (status, body) = get(router(&server), "/jobs/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Job not found" }));
}

#[tokio::test]
async fn test_rejected_id_result_url_is_not_found() {
    let server = MockServer::start().await;
    mount_invalid_uuid(&server).await;

    let (status, body) = get(router(&server), "/jobs/nope/url").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Job not found" }));
}

#[tokio::test]
async fn test_empty_lookup_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = get(router(&server), "/jobs/4b7c2f9e-0000-4000-8000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found");
}

#[tokio::test]
async fn test_store_outage_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let (status, body) = get(router(&server), "/jobs/4b7c2f9e-0000-4000-8000-000000000000").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}
