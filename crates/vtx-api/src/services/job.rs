//! Job operations behind the HTTP handlers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use vtx_jobstore::JobStore;
use vtx_models::{
    upload_object_key, CreateJobRequest, Job, JobId, JobStatus, NewJob, SignedUrlResponse, StoreUri,
    UploadPolicy, UploadUrlRequest, UploadUrlResponse,
};
use vtx_storage::ObjectStore;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Upload URL issuance and job bookkeeping.
#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    objects: Arc<dyn ObjectStore>,
    /// Bucket new uploads land in
    bucket: String,
    policy: UploadPolicy,
    default_user_id: Option<String>,
    upload_url_ttl: Duration,
    result_url_ttl: Duration,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        objects: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        config: &ApiConfig,
    ) -> Self {
        Self {
            jobs,
            objects,
            bucket: bucket.into(),
            policy: config.upload_policy.clone(),
            default_user_id: config.default_user_id.clone(),
            upload_url_ttl: config.upload_url_ttl,
            result_url_ttl: config.result_url_ttl,
        }
    }

    /// Validate the declared upload and presign a PUT for a fresh key.
    ///
    /// Nothing is written on rejection.
    pub async fn get_upload_url(&self, request: &UploadUrlRequest) -> ApiResult<UploadUrlResponse> {
        let accepted = self.policy.check(request).map_err(|rejection| {
            metrics::record_upload_rejected(&rejection);
            rejection
        })?;

        let target = StoreUri::new(&self.bucket, upload_object_key(&accepted.filename));
        let upload_url = self
            .objects
            .presign_put(&target, &accepted.content_type, self.upload_url_ttl)
            .await?;

        metrics::record_upload_url_issued();
        info!(file_url = %target, size = accepted.size, "Issued upload URL");

        Ok(UploadUrlResponse {
            upload_url,
            file_url: target.to_string(),
        })
    }

    /// Insert a `Queued` job. The reference is stored as given; the worker
    /// fails the job if it cannot be resolved.
    pub async fn create_job(&self, request: CreateJobRequest) -> ApiResult<Job> {
        let file_url = request
            .file_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("fileUrl is required"))?;

        let user_id = request
            .user_id
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.default_user_id.clone());

        if StoreUri::parse(&file_url).is_err() {
            warn!(file_url = %file_url, "Queuing job with unresolvable file reference");
        }

        let job = self.jobs.insert(NewJob::new(file_url, user_id)).await?;
        metrics::record_job_created();
        info!(job_id = %job.id, "Job created");

        Ok(job)
    }

    /// Look up a job. A lookup the store rejects outright, such as an id the
    /// column type cannot hold, is reported as a missing job.
    pub async fn get_job(&self, id: &JobId) -> ApiResult<Job> {
        match self.jobs.get(id).await {
            Ok(Some(job)) => Ok(job),
            Ok(None) => Err(ApiError::not_found("Job not found")),
            Err(e) if e.is_client_error() => {
                debug!(job_id = %id, "Job lookup rejected: {}", e);
                Err(ApiError::not_found("Job not found"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Presigned GET for a `Done` job's result.
    pub async fn get_result_url(&self, id: &JobId) -> ApiResult<SignedUrlResponse> {
        let job = self.get_job(id).await?;

        let result_url = match (job.status, job.result_url.as_deref()) {
            (JobStatus::Done, Some(url)) => url,
            _ => return Err(ApiError::not_ready("Job not finished yet")),
        };

        let result = StoreUri::parse(result_url).map_err(|e| {
            ApiError::internal(format!("job {} has a malformed result reference: {}", id, e))
        })?;
        let signed_url = self.objects.presign_get(&result, self.result_url_ttl).await?;

        Ok(SignedUrlResponse { signed_url })
    }

    /// Jobs owned by `user_id`, newest first.
    pub async fn list_jobs(&self, user_id: Option<&str>) -> ApiResult<Vec<Job>> {
        let user_id = user_id
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("userId is required"))?;

        Ok(self.jobs.list_by_user(user_id).await?)
    }

    /// Job store and object store reachability, for readiness checks.
    pub async fn check_dependencies(&self) -> (ApiResult<()>, ApiResult<()>) {
        let jobs = self.jobs.ping().await.map_err(ApiError::from);
        let objects = self.objects.check_connectivity().await.map_err(ApiError::from);
        (jobs, objects)
    }
}
