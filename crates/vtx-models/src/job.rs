//! Job record and status state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a job.
///
/// The job store generates these; `new()` exists for in-process stores and tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job status as stored in the `status` column.
///
/// Transitions are monotonic: `Queued -> Processing -> {Done | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum JobStatus {
    /// Waiting for a worker to claim it
    #[default]
    Queued,
    /// Claimed by a worker, pipeline running
    Processing,
    /// Result uploaded, `result_url` set
    Done,
    /// Pipeline failed, `error` set
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Processing => "Processing",
            JobStatus::Done => "Done",
            JobStatus::Failed => "Failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Done)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Queued" => Ok(JobStatus::Queued),
            "Processing" => Ok(JobStatus::Processing),
            "Done" => Ok(JobStatus::Done),
            "Failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// Violations of the per-status field invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobInvariantError {
    #[error("job {0} has result_url but status is not Done")]
    UnexpectedResult(JobId),

    #[error("job {0} is Done without a result_url")]
    MissingResult(JobId),

    #[error("job {0} has error but status is not Failed")]
    UnexpectedError(JobId),

    #[error("job {0} is Failed without an error")]
    MissingError(JobId),
}

/// One requested transcode and its current outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Store-generated identifier
    pub id: JobId,

    /// Owner reference
    #[serde(default)]
    pub user_id: Option<String>,

    /// Source object reference (`store://bucket/key`)
    pub file_url: String,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Result object reference, present iff Done
    #[serde(default)]
    pub result_url: Option<String>,

    /// Failure description, present iff Failed
    #[serde(default)]
    pub error: Option<String>,

    /// Ordering key
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Build a freshly queued job. Used by in-process stores.
    pub fn queued(id: JobId, new: NewJob) -> Self {
        Self {
            id,
            user_id: new.user_id,
            file_url: new.file_url,
            status: JobStatus::Queued,
            result_url: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check `result_url <=> Done` and `error <=> Failed`.
    pub fn validate(&self) -> Result<(), JobInvariantError> {
        match (self.status, self.result_url.is_some()) {
            (JobStatus::Done, false) => return Err(JobInvariantError::MissingResult(self.id.clone())),
            (s, true) if s != JobStatus::Done => {
                return Err(JobInvariantError::UnexpectedResult(self.id.clone()))
            }
            _ => {}
        }
        match (self.status, self.error.is_some()) {
            (JobStatus::Failed, false) => Err(JobInvariantError::MissingError(self.id.clone())),
            (s, true) if s != JobStatus::Failed => {
                Err(JobInvariantError::UnexpectedError(self.id.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Insert payload for a new job row. Status is always `Queued`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewJob {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub file_url: String,
    pub status: JobStatus,
}

impl NewJob {
    pub fn new(file_url: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            user_id,
            file_url: file_url.into(),
            status: JobStatus::Queued,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Done));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));

        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Queued));
        for terminal in [JobStatus::Done, JobStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                JobStatus::Queued,
                JobStatus::Processing,
                JobStatus::Done,
                JobStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&JobStatus::Processing).unwrap(), "\"Processing\"");
        let parsed: JobStatus = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(parsed, JobStatus::Done);
        assert_eq!("Failed".parse::<JobStatus>().unwrap(), JobStatus::Failed);
        assert!("done".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_queued_job_has_no_outcome() {
        let job = Job::queued(JobId::new(), NewJob::new("store://b/uploads/a.mp4", None));
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result_url.is_none());
        assert!(job.error.is_none());
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_validate_field_invariants() {
        let mut job = Job::queued(JobId::new(), NewJob::new("store://b/k", None));
        job.status = JobStatus::Done;
        assert!(matches!(job.validate(), Err(JobInvariantError::MissingResult(_))));

        job.result_url = Some("store://b/outputs/x.mp4".into());
        assert!(job.validate().is_ok());

        job.status = JobStatus::Failed;
        assert!(matches!(job.validate(), Err(JobInvariantError::UnexpectedResult(_))));

        job.result_url = None;
        job.error = Some("boom".into());
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_job_deserializes_store_row() {
        let row = r#"{
            "id": "7b0c2a4e-1111-2222-3333-444455556666",
            "user_id": "u-1",
            "file_url": "store://media/uploads/abc-clip.mp4",
            "status": "Queued",
            "result_url": null,
            "error": null,
            "created_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let job: Job = serde_json::from_str(row).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.user_id.as_deref(), Some("u-1"));
        assert!(job.result_url.is_none());
    }
}
