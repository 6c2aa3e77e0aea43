//! Transcode worker.
//!
//! This crate provides:
//! - The dispatcher loop that claims queued jobs one at a time
//! - The transcode pipeline (download, encode, upload, scratch cleanup)
//! - Final status writes with retry
//! - A health endpoint for the wake probe
//! - Graceful shutdown between jobs

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod retry;

pub use config::{ClaimMode, WorkerConfig};
pub use dispatcher::{Dispatcher, TickOutcome};
pub use error::{PipelineError, WorkerError, WorkerResult};
pub use health::{health_router, serve_health, WorkerHealth};
pub use logging::JobLogger;
pub use pipeline::TranscodePipeline;
