//! Upload URL handler.

use axum::extract::State;
use axum::Json;
use vtx_models::{UploadUrlRequest, UploadUrlResponse};

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// `POST /upload-url`
pub async fn create_upload_url(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadUrlRequest>,
) -> ApiResult<Json<UploadUrlResponse>> {
    Ok(Json(state.jobs.get_upload_url(&request).await?))
}
