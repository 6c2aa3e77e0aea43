//! Worker health endpoint, consumed by the edge API's wake probe.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

/// Liveness state shared between the dispatcher and the health server.
#[derive(Debug, Default)]
pub struct WorkerHealth {
    polling: AtomicBool,
    jobs_processed: AtomicU64,
    /// Unix seconds of the last poll, 0 before the first.
    last_poll: AtomicI64,
}

impl WorkerHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher loop entered.
    pub fn mark_polling(&self) {
        self.polling.store(true, Ordering::SeqCst);
    }

    /// Dispatcher loop left.
    pub fn mark_stopped(&self) {
        self.polling.store(false, Ordering::SeqCst);
    }

    pub fn record_poll(&self) {
        self.last_poll.store(Utc::now().timestamp(), Ordering::SeqCst);
    }

    pub fn record_job(&self) {
        self.jobs_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }

    pub fn jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::SeqCst)
    }

    fn last_poll_at(&self) -> Option<DateTime<Utc>> {
        match self.last_poll.load(Ordering::SeqCst) {
            0 => None,
            secs => DateTime::from_timestamp(secs, 0),
        }
    }
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub polling: bool,
    pub jobs_processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_poll_at: Option<String>,
}

async fn health(
    State(state): State<Arc<WorkerHealth>>,
) -> (StatusCode, Json<HealthResponse>) {
    let polling = state.is_polling();
    let status = if polling { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(HealthResponse {
            status: if polling { "ok" } else { "starting" },
            version: env!("CARGO_PKG_VERSION"),
            polling,
            jobs_processed: state.jobs_processed(),
            last_poll_at: state.last_poll_at().map(|t| t.to_rfc3339()),
        }),
    )
}

pub fn health_router(state: Arc<WorkerHealth>) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Serve `/health` on `addr` until `shutdown` flips to true.
pub async fn serve_health(
    addr: &str,
    state: Arc<WorkerHealth>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health server listening on {}", addr);

    axum::serve(listener, health_router(state))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
}
