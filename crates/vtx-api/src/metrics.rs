//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use vtx_models::{UploadRejection, WakeStatus};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vtx_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vtx_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vtx_http_requests_in_flight";

    // Edge operations
    pub const UPLOAD_URLS_ISSUED_TOTAL: &str = "vtx_upload_urls_issued_total";
    pub const UPLOAD_REJECTIONS_TOTAL: &str = "vtx_upload_rejections_total";
    pub const JOBS_CREATED_TOTAL: &str = "vtx_jobs_created_total";
    pub const WAKE_PROBES_TOTAL: &str = "vtx_wake_probes_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_upload_url_issued() {
    counter!(names::UPLOAD_URLS_ISSUED_TOTAL).increment(1);
}

pub fn record_upload_rejected(rejection: &UploadRejection) {
    let reason = match rejection {
        UploadRejection::MissingFields => "missing_fields",
        UploadRejection::InvalidFilename(_) => "invalid_filename",
        UploadRejection::TooLarge { .. } => "too_large",
        UploadRejection::UnsupportedType { .. } => "unsupported_type",
    };
    counter!(names::UPLOAD_REJECTIONS_TOTAL, "reason" => reason).increment(1);
}

pub fn record_job_created() {
    counter!(names::JOBS_CREATED_TOTAL).increment(1);
}

pub fn record_wake_probe(status: WakeStatus) {
    let status = match status {
        WakeStatus::Awake => "awake",
        WakeStatus::Asleep => "asleep",
    };
    counter!(names::WAKE_PROBES_TOTAL, "status" => status).increment(1);
}

/// Route template for the path label, so job ids don't explode cardinality.
fn path_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = path_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
