//! Job handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use vtx_models::{CreateJobRequest, Job, JobId, SignedUrlResponse};

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// `GET /jobs` query.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// `POST /jobs`
pub async fn create_job(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateJobRequest>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.jobs.create_job(request).await?))
}

/// `GET /jobs/:id`
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.jobs.get_job(&JobId::from_string(id)).await?))
}

/// `GET /jobs/:id/url`
pub async fn get_result_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SignedUrlResponse>> {
    Ok(Json(state.jobs.get_result_url(&JobId::from_string(id)).await?))
}

/// `GET /jobs?userId=`
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.jobs.list_jobs(query.user_id.as_deref()).await?))
}
