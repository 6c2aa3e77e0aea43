//! Follow a job until it reaches a terminal status.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use vtx_models::{Job, JobId, JobStatus};

use crate::client::ApiClient;
use crate::error::ClientResult;

/// Terminal job plus, for `Done` jobs, a signed result URL when one could be
/// fetched.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: Job,
    pub signed_url: Option<String>,
}

/// Poll `GET /jobs/:id` every `interval` until the job is `Done` or `Failed`.
///
/// Transient fetch failures are logged and polling continues; client errors
/// such as an unknown job end the wait. A failed result URL fetch does not
/// fail the outcome.
pub async fn follow_job(client: &ApiClient, id: &JobId, interval: Duration) -> ClientResult<JobOutcome> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_status: Option<JobStatus> = None;

    let job = loop {
        ticker.tick().await;

        match client.get_job(id).await {
            Ok(job) if job.is_terminal() => break job,
            Ok(job) => {
                if last_status != Some(job.status) {
                    debug!(job_id = %id, status = %job.status, "Job status");
                    last_status = Some(job.status);
                }
            }
            Err(e) if e.is_transient() => warn!(job_id = %id, "Job status fetch failed: {}", e),
            Err(e) => return Err(e),
        }
    };

    let signed_url = if job.status == JobStatus::Done {
        match client.get_result_url(id).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(job_id = %id, "Failed to fetch result URL: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(JobOutcome { job, signed_url })
}
