//! Dispatcher metrics.

use metrics::counter;
use vtx_models::JobStatus;

/// Metric name constants.
pub mod names {
    /// Jobs moved to `Processing` by this worker.
    pub const JOBS_CLAIMED_TOTAL: &str = "vtx_jobs_claimed_total";

    /// Claims that found the row no longer queued.
    pub const JOBS_CLAIM_LOST_TOTAL: &str = "vtx_jobs_claim_lost_total";

    /// Terminal statuses written, labelled by status.
    pub const JOBS_FINISHED_TOTAL: &str = "vtx_jobs_finished_total";

    /// Pipeline failures, labelled by kind.
    pub const JOBS_FAILED_TOTAL: &str = "vtx_jobs_failed_total";

    /// Jobs whose terminal status could not be written.
    pub const JOBS_ORPHANED_TOTAL: &str = "vtx_jobs_orphaned_total";

    /// Job store errors seen by the poll loop.
    pub const STORE_ERRORS_TOTAL: &str = "vtx_jobs_store_errors_total";
}

pub fn record_claimed() {
    counter!(names::JOBS_CLAIMED_TOTAL).increment(1);
}

pub fn record_claim_lost() {
    counter!(names::JOBS_CLAIM_LOST_TOTAL).increment(1);
}

pub fn record_finished(status: JobStatus) {
    counter!(names::JOBS_FINISHED_TOTAL, "status" => status.as_str()).increment(1);
}

pub fn record_pipeline_failure(kind: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "kind" => kind).increment(1);
}

pub fn record_orphaned() {
    counter!(names::JOBS_ORPHANED_TOTAL).increment(1);
}

pub fn record_store_error(operation: &'static str) {
    counter!(names::STORE_ERRORS_TOTAL, "operation" => operation).increment(1);
}
