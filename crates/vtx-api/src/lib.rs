//! Axum edge API for the transcode service.
//!
//! This crate provides:
//! - Presigned upload URLs gated by the upload policy
//! - Job submission, lookup and listing against the job store
//! - Presigned result URLs for finished jobs
//! - The worker wake probe
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod wake;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::JobService;
pub use state::AppState;
pub use wake::WakeProbe;
