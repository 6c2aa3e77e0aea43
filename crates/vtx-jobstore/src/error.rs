//! Job store error types.

use thiserror::Error;
use vtx_models::JobStatus;

/// Result type for job store operations.
pub type JobStoreResult<T> = Result<T, JobStoreError>;

/// Errors that can occur while talking to the job table.
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Illegal status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Job store unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobStoreError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Map a non-2xx PostgREST response to an error.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            401 | 403 => Self::AuthError(msg),
            404 => Self::NotFound(msg),
            409 => Self::Conflict(msg),
            429 | 500..=599 => Self::Unavailable(format!("HTTP {}: {}", status, msg)),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, msg)),
        }
    }

    /// HTTP status to report in request metrics.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::AuthError(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Conflict(_) | Self::InvalidTransition { .. } => Some(409),
            Self::Unavailable(_) => Some(503),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Unavailable(_))
    }

    /// The lookup itself was rejected (unknown row, or a filter value the
    /// table cannot hold).
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::RequestFailed(msg) => msg.starts_with("HTTP 4"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            JobStoreError::from_http_status(401, "nope"),
            JobStoreError::AuthError(_)
        ));
        assert!(matches!(
            JobStoreError::from_http_status(503, "down"),
            JobStoreError::Unavailable(_)
        ));
        assert!(matches!(
            JobStoreError::from_http_status(500, "boom"),
            JobStoreError::Unavailable(_)
        ));
        assert!(matches!(
            JobStoreError::from_http_status(429, "slow down"),
            JobStoreError::Unavailable(_)
        ));
        assert!(matches!(
            JobStoreError::from_http_status(400, "bad filter"),
            JobStoreError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_client_error() {
        assert!(JobStoreError::from_http_status(400, "22P02").is_client_error());
        assert!(JobStoreError::from_http_status(404, "gone").is_client_error());
        assert!(!JobStoreError::from_http_status(401, "nope").is_client_error());
        assert!(!JobStoreError::from_http_status(503, "down").is_client_error());
    }

    #[test]
    fn test_retryable() {
        assert!(JobStoreError::unavailable("x").is_retryable());
        assert!(!JobStoreError::not_found("x").is_retryable());
        assert!(!JobStoreError::AuthError("bad key".into()).is_retryable());
        assert!(!JobStoreError::from_http_status(400, "bad filter").is_retryable());
        assert!(!JobStoreError::InvalidTransition {
            from: JobStatus::Done,
            to: JobStatus::Processing
        }
        .is_retryable());
    }
}
