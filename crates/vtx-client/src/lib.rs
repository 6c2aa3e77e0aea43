//! Client for the vtx edge API.
//!
//! This crate provides:
//! - `ApiClient`, a typed reqwest client for every edge route
//! - `WakeWatcher`, which polls the wake probe until the worker is up
//! - Job following: poll a job until it is `Done` or `Failed`

pub mod client;
pub mod config;
pub mod error;
pub mod follow;
pub mod watcher;

pub use client::{content_type_for, ApiClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use follow::{follow_job, JobOutcome};
pub use watcher::{wait_for_awake, WakeSource, WakeWatcher};
