//! Structured job logging.
//!
//! Lifecycle events carry `job_id` and `operation` fields so one job can be
//! followed across claim, pipeline steps and the final status write.

use tracing::{error, info, warn, Span};
use vtx_models::{JobId, JobStatus};

/// Logger bound to one job and operation.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Job claimed and moved to `Processing`.
    pub fn log_claimed(&self, file_url: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            file_url = %file_url,
            "Job claimed"
        );
    }

    /// A pipeline step finished.
    pub fn log_step(&self, step: &str, detail: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            step = %step,
            "Job step: {}", detail
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Pipeline failed; `kind` is the short failure label.
    pub fn log_failure(&self, kind: &str, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            failure = %kind,
            "Job failed: {}", message
        );
    }

    /// Terminal status recorded in the store.
    pub fn log_recorded(&self, status: JobStatus) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            status = %status,
            "Job status recorded"
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping everything done for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::from_string("job-42");
        let logger = JobLogger::new(&job_id, "transcode");

        assert_eq!(logger.job_id(), "job-42");
        assert_eq!(logger.operation(), "transcode");
    }
}
