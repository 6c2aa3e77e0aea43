//! The job store capability.

use async_trait::async_trait;
use serde::Serialize;
use vtx_models::{Job, JobId, JobStatus, NewJob};

use crate::error::JobStoreResult;

/// Partial update of a job row.
///
/// With `expected_status` set, the update only applies when the row is still in
/// that status (`UPDATE ... WHERE id = ? AND status = ?`). That conditional form
/// is the claim primitive for competing workers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobUpdate {
    pub status: JobStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    pub expected_status: Option<JobStatus>,
}

impl JobUpdate {
    /// Move a job into `Processing`.
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            result_url: None,
            error: None,
            expected_status: None,
        }
    }

    /// Finish a job successfully with its result reference.
    pub fn done(result_url: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Done,
            result_url: Some(result_url.into()),
            error: None,
            expected_status: None,
        }
    }

    /// Finish a job with a failure description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            result_url: None,
            error: Some(error.into()),
            expected_status: None,
        }
    }

    /// Only apply when the row currently has `status`.
    pub fn only_if(mut self, status: JobStatus) -> Self {
        self.expected_status = Some(status);
        self
    }

    /// Apply the update to an in-memory row.
    pub fn apply_to(&self, job: &mut Job) {
        job.status = self.status;
        if self.result_url.is_some() {
            job.result_url = self.result_url.clone();
        }
        if self.error.is_some() {
            job.error = self.error.clone();
        }
    }
}

/// Persistent job table shared by the edge API and the worker.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new row; the store assigns `id` and `created_at`.
    async fn insert(&self, job: NewJob) -> JobStoreResult<Job>;

    /// Fetch one job by id.
    async fn get(&self, id: &JobId) -> JobStoreResult<Option<Job>>;

    /// Fetch at most one `Queued` job. No ordering guarantee.
    async fn find_queued(&self) -> JobStoreResult<Option<Job>>;

    /// Apply a partial update. Returns `None` when no row matched, including
    /// when `expected_status` did not hold.
    async fn update(&self, id: &JobId, update: JobUpdate) -> JobStoreResult<Option<Job>>;

    /// All jobs owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: &str) -> JobStoreResult<Vec<Job>>;

    /// Cheap reachability check.
    async fn ping(&self) -> JobStoreResult<()>;
}
