//! Wake probe against a mock worker.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use vtx_api::{create_router, ApiConfig, AppState, WakeProbe};
use vtx_jobstore::MemoryJobStore;
use vtx_models::WakeStatus;
use vtx_storage::MemoryObjectStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn worker_returning(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_healthy_worker_is_awake() {
    let server = worker_returning(ResponseTemplate::new(200).set_body_string("{\"status\":\"ok\"}")).await;
    let probe = WakeProbe::new(&server.uri(), Duration::from_secs(2)).unwrap();

    assert_eq!(probe.probe().await, WakeStatus::Awake);
}

#[tokio::test]
async fn test_unhealthy_worker_is_asleep() {
    let server = worker_returning(ResponseTemplate::new(503)).await;
    let probe = WakeProbe::new(&server.uri(), Duration::from_secs(2)).unwrap();

    assert_eq!(probe.probe().await, WakeStatus::Asleep);
}

#[tokio::test]
async fn test_slow_worker_is_asleep() {
    let server = worker_returning(ResponseTemplate::new(200).set_delay(Duration::from_secs(3))).await;
    let probe = WakeProbe::new(&server.uri(), Duration::from_millis(200)).unwrap();

    assert_eq!(probe.probe().await, WakeStatus::Asleep);
}

#[tokio::test]
async fn test_unreachable_worker_is_asleep() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let probe = WakeProbe::new(&uri, Duration::from_secs(1)).unwrap();
    assert_eq!(probe.probe().await, WakeStatus::Asleep);
}

#[tokio::test]
async fn test_wake_route_reports_awake() {
    let server = worker_returning(ResponseTemplate::new(200)).await;
    let config = ApiConfig {
        worker_url: server.uri(),
        ..ApiConfig::default()
    };
    let state = AppState::new(
        config,
        Arc::new(MemoryJobStore::new()),
        Arc::new(MemoryObjectStore::new()),
        "videos",
    )
    .unwrap();

    let response = create_router(state, None)
        .oneshot(Request::builder().uri("/wake").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "awake");
}
