//! JSON bodies exchanged with the edge API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::wake::WakeStatus;

/// `POST /upload-url` body. Fields are optional so missing ones map to a 400.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    #[validate(length(max = 255))]
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// `POST /upload-url` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    /// Presigned PUT URL
    pub upload_url: String,
    /// Canonical `store://` reference to pass to `POST /jobs`
    pub file_url: String,
}

/// `POST /jobs` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(length(min = 1))]
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// `GET /jobs/{id}/url` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub signed_url: String,
}

/// `GET /wake` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WakeResponse {
    pub status: WakeStatus,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_request_camel_case() {
        let req: UploadUrlRequest = serde_json::from_str(
            r#"{"filename":"a.mp4","contentType":"video/mp4","fileSize":2048}"#,
        )
        .unwrap();
        assert_eq!(req.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(req.file_size, Some(2048));

        let empty: UploadUrlRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.filename.is_none());
    }

    #[test]
    fn test_create_job_validation() {
        let ok = CreateJobRequest {
            file_url: Some("store://b/k".into()),
            user_id: None,
        };
        assert!(ok.validate().is_ok());

        let empty = CreateJobRequest {
            file_url: Some(String::new()),
            user_id: None,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_wake_response_shape() {
        let body = serde_json::to_value(WakeResponse { status: WakeStatus::Asleep }).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "asleep" }));
    }
}
