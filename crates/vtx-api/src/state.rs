//! Application state.

use std::sync::Arc;

use vtx_jobstore::{JobStore, PostgrestClient};
use vtx_storage::{ObjectStore, R2Client};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::services::JobService;
use crate::wake::WakeProbe;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: JobService,
    pub wake: WakeProbe,
}

impl AppState {
    /// Build state over explicit stores. New uploads go to `bucket`.
    pub fn new(
        config: ApiConfig,
        job_store: Arc<dyn JobStore>,
        object_store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
    ) -> ApiResult<Self> {
        let jobs = JobService::new(job_store, object_store, bucket, &config);
        let wake = WakeProbe::new(&config.worker_url, config.wake_timeout)?;

        Ok(Self { config, jobs, wake })
    }

    /// Build state over the PostgREST job table and R2.
    pub fn from_env(config: ApiConfig) -> ApiResult<Self> {
        let job_store = PostgrestClient::from_env()?;
        let object_store = R2Client::from_env()?;
        let bucket = object_store.bucket().to_string();

        Self::new(config, Arc::new(job_store), Arc::new(object_store), bucket)
    }
}
