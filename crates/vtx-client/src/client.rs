//! Typed HTTP client for the edge API.

use std::path::Path;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use vtx_models::{
    CreateJobRequest, ErrorBody, Job, JobId, SignedUrlResponse, UploadUrlRequest, UploadUrlResponse,
    WakeResponse, WakeStatus,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Edge API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a 2xx body, or turn the `{error}` body into `ClientError::Api`.
    async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| {
                    if body.is_empty() {
                        status.canonical_reason().unwrap_or("request failed").to_string()
                    } else {
                        body
                    }
                });
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::invalid_response(format!("{}: {}", e, body)))
    }

    /// `POST /upload-url`
    pub async fn get_upload_url(&self, request: &UploadUrlRequest) -> ClientResult<UploadUrlResponse> {
        let response = self.http.post(self.url("/upload-url")).json(request).send().await?;
        Self::read_json(response).await
    }

    /// PUT `bytes` to a presigned upload URL.
    pub async fn put_file(&self, upload_url: &str, bytes: Vec<u8>, content_type: &str) -> ClientResult<()> {
        let size = bytes.len();
        let response = self
            .http
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Upload {
                status: status.as_u16(),
                message,
            });
        }

        debug!(size, "Uploaded file");
        Ok(())
    }

    /// `POST /jobs`
    pub async fn create_job(&self, request: &CreateJobRequest) -> ClientResult<Job> {
        let response = self.http.post(self.url("/jobs")).json(request).send().await?;
        Self::read_json(response).await
    }

    /// `GET /jobs/:id`
    pub async fn get_job(&self, id: &JobId) -> ClientResult<Job> {
        let response = self.http.get(self.url(&format!("/jobs/{}", id))).send().await?;
        Self::read_json(response).await
    }

    /// `GET /jobs/:id/url`, returning the signed URL.
    pub async fn get_result_url(&self, id: &JobId) -> ClientResult<String> {
        let response = self.http.get(self.url(&format!("/jobs/{}/url", id))).send().await?;
        let body: SignedUrlResponse = Self::read_json(response).await?;
        Ok(body.signed_url)
    }

    /// `GET /jobs?userId=`
    pub async fn list_jobs(&self, user_id: &str) -> ClientResult<Vec<Job>> {
        let response = self
            .http
            .get(self.url("/jobs"))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// `GET /wake`
    pub async fn wake(&self) -> ClientResult<WakeStatus> {
        let response = self.http.get(self.url("/wake")).send().await?;
        let body: WakeResponse = Self::read_json(response).await?;
        Ok(body.status)
    }

    /// Request an upload URL for `path`, upload it, and queue a job for it.
    pub async fn submit_file(
        &self,
        path: &Path,
        content_type: &str,
        user_id: Option<String>,
    ) -> ClientResult<Job> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::config_error(format!("no usable filename in {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        let upload = self
            .get_upload_url(&UploadUrlRequest {
                filename: Some(filename),
                content_type: Some(content_type.to_string()),
                file_size: Some(bytes.len() as u64),
            })
            .await?;

        self.put_file(&upload.upload_url, bytes, content_type).await?;
        info!(file_url = %upload.file_url, "Upload complete");

        self.create_job(&CreateJobRequest {
            file_url: Some(upload.file_url),
            user_id,
        })
        .await
    }
}

/// Video MIME type for a file extension, if it is one the API accepts by default.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        "avi" => Some("video/x-msvideo"),
        "mkv" => Some("video/x-matroska"),
        _ => None,
    }
}
