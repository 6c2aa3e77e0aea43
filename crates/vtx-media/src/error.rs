//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that stop an encode from producing an exit status.
///
/// A process that runs and exits non-zero is not an error here; it is reported as
/// `EncodeOutcome::Failed`.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found")]
    FfmpegNotFound,

    #[error("FFmpeg binary not found at {0}")]
    BinaryNotFound(PathBuf),

    #[error("Encode timed out after {0} seconds")]
    Timeout(u64),

    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True when the encoder could not be started at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::FfmpegNotFound | Self::BinaryNotFound(_))
    }
}
