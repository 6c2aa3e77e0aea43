//! Client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx from the edge API, carrying its `{error}` text.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Non-2xx from the presigned upload target.
    #[error("Upload failed ({status}): {message}")]
    Upload { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// HTTP status of an API or upload failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Upload { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Worth polling again: network failures and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
