//! Job dispatcher: poll, claim, run the pipeline, record the outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};
use vtx_jobstore::{JobStore, JobStoreError, JobUpdate};
use vtx_models::{Job, JobId, JobStatus};

use crate::config::{ClaimMode, WorkerConfig};
use crate::error::WorkerResult;
use crate::health::WorkerHealth;
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::TranscodePipeline;
use crate::retry::{retry_async, FailureTracker, RetryConfig, RetryResult};

/// What one dispatcher iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No queued job.
    Idle,
    /// A job ran to a terminal status.
    Processed { job_id: JobId, status: JobStatus },
    /// The queued row was claimed by someone else first.
    ClaimLost,
    /// The job store failed; nothing was processed, or a terminal status could
    /// not be written.
    StoreUnavailable,
}

/// Serial job loop. One pipeline runs at a time per dispatcher.
pub struct Dispatcher {
    jobs: Arc<dyn JobStore>,
    pipeline: TranscodePipeline,
    config: WorkerConfig,
    health: Arc<WorkerHealth>,
}

impl Dispatcher {
    pub fn new(jobs: Arc<dyn JobStore>, pipeline: TranscodePipeline, config: WorkerConfig) -> Self {
        Self {
            jobs,
            pipeline,
            config,
            health: Arc::new(WorkerHealth::new()),
        }
    }

    /// Share liveness state with a health server.
    pub fn with_health(mut self, health: Arc<WorkerHealth>) -> Self {
        self.health = health;
        self
    }

    pub fn health(&self) -> Arc<WorkerHealth> {
        Arc::clone(&self.health)
    }

    /// Run until `shutdown` becomes true. A job in flight is always finished
    /// before the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        info!(
            claim_mode = ?self.config.claim_mode,
            poll_interval_secs = self.config.poll_interval.as_secs(),
            work_dir = %self.pipeline.work_dir().display(),
            "Starting dispatcher"
        );
        self.health.mark_polling();

        let mut store_failures = FailureTracker::new(3);

        loop {
            if *shutdown.borrow() {
                info!("Shutdown signal received, stopping dispatcher");
                break;
            }

            let outcome = self.tick().await;
            let wait = match &outcome {
                TickOutcome::Idle => {
                    store_failures.record_success();
                    self.config.poll_interval
                }
                TickOutcome::StoreUnavailable => {
                    if store_failures.record_failure() {
                        warn!(
                            "Job store unavailable, backing off for {:?}",
                            self.config.error_backoff
                        );
                    }
                    self.config.error_backoff
                }
                TickOutcome::Processed { .. } | TickOutcome::ClaimLost => {
                    store_failures.record_success();
                    Duration::ZERO
                }
            };

            if wait.is_zero() {
                continue;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown channel closed, stopping dispatcher");
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        self.health.mark_stopped();
        info!("Dispatcher stopped");
        Ok(())
    }

    /// One iteration: find a queued job, claim it, process it, record the outcome.
    pub async fn tick(&self) -> TickOutcome {
        self.health.record_poll();

        let job = match self.jobs.find_queued().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("No queued jobs");
                return TickOutcome::Idle;
            }
            Err(e) => {
                metrics::record_store_error("find_queued");
                debug!("Queued job query failed: {}", e);
                return TickOutcome::StoreUnavailable;
            }
        };

        let claimed = match self.claim(&job).await {
            Ok(Some(claimed)) => claimed,
            Ok(None) => {
                metrics::record_claim_lost();
                info!(job_id = %job.id, "Job claimed by another worker");
                return TickOutcome::ClaimLost;
            }
            Err(outcome) => return outcome,
        };

        let logger = JobLogger::new(&claimed.id, "transcode");
        let span = logger.create_span();
        self.process(claimed, logger).instrument(span).await
    }

    /// Move `job` to `Processing`.
    async fn claim(&self, job: &Job) -> Result<Option<Job>, TickOutcome> {
        let update = match self.config.claim_mode {
            ClaimMode::Conditional => JobUpdate::processing().only_if(JobStatus::Queued),
            ClaimMode::ReadThenWrite => JobUpdate::processing(),
        };

        match self.jobs.update(&job.id, update).await {
            Ok(claimed) => Ok(claimed),
            Err(e) => {
                metrics::record_store_error("claim");
                warn!(job_id = %job.id, "Failed to claim job: {}", e);
                Err(TickOutcome::StoreUnavailable)
            }
        }
    }

    async fn process(&self, job: Job, logger: JobLogger) -> TickOutcome {
        metrics::record_claimed();
        logger.log_claimed(&job.file_url);

        let update = match self.pipeline.run(&job).await {
            Ok(result) => {
                logger.log_step("pipeline", &format!("result at {}", result));
                JobUpdate::done(result.to_string())
            }
            Err(e) => {
                metrics::record_pipeline_failure(e.kind());
                logger.log_failure(e.kind(), &e.to_string());
                JobUpdate::failed(e.to_string())
            }
        }
        .only_if(JobStatus::Processing);

        let status = update.status;
        self.health.record_job();

        if self.record_outcome(&job.id, update, &logger).await {
            metrics::record_finished(status);
            TickOutcome::Processed {
                job_id: job.id,
                status,
            }
        } else {
            TickOutcome::StoreUnavailable
        }
    }

    /// Write the terminal status, retrying transient store errors. Returns
    /// false when the job is left at `Processing`.
    async fn record_outcome(&self, id: &JobId, update: JobUpdate, logger: &JobLogger) -> bool {
        let retry = RetryConfig::new("final_status_write")
            .with_max_retries(self.config.status_write_retries);
        let status = update.status;

        let written = retry_async(&retry, JobStoreError::is_retryable, || {
            let update = update.clone();
            async move { self.jobs.update(id, update).await }
        })
        .await;

        match written {
            RetryResult::Success(Some(_)) => {
                logger.log_recorded(status);
                true
            }
            RetryResult::Success(None) => {
                // Someone else moved the row out of Processing; theirs wins.
                logger.log_warning(&format!(
                    "{} not recorded, row no longer Processing",
                    status
                ));
                true
            }
            RetryResult::Failed { error, attempts } => {
                metrics::record_orphaned();
                error!(
                    job_id = %id,
                    status = %status,
                    attempts,
                    "Final status write failed, job left at Processing: {}",
                    error
                );
                false
            }
        }
    }
}
