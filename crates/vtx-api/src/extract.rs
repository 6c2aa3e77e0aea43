//! Extractors whose rejections use the API error body.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `Json<T>` that rejects malformed bodies with a 400 `{error}` response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
