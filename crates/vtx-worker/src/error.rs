//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Job store error: {0}")]
    JobStore(#[from] vtx_jobstore::JobStoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] vtx_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] vtx_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Why a pipeline run did not produce a result.
///
/// The `Display` text is what gets written to the job's `error` column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("malformed file reference: {0}")]
    MalformedReference(String),

    #[error("transfer failed: {0}")]
    TransferFailure(String),

    #[error("encode failed: {}", describe_exit(.exit_code))]
    EncodeFailure { exit_code: Option<i32> },

    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("encode timed out after {secs}s")]
    EncodeTimeout { secs: u64 },
}

impl PipelineError {
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::TransferFailure(msg.into())
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedReference(_) => "malformed_reference",
            Self::TransferFailure(_) => "transfer_failure",
            Self::EncodeFailure { .. } => "encode_failure",
            Self::EncoderUnavailable(_) => "encoder_unavailable",
            Self::EncodeTimeout { .. } => "encode_timeout",
        }
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("encoder exited with code {}", code),
        None => "encoder terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_failure_text() {
        let err = PipelineError::EncodeFailure { exit_code: Some(1) };
        assert_eq!(err.to_string(), "encode failed: encoder exited with code 1");

        let err = PipelineError::EncodeFailure { exit_code: None };
        assert_eq!(err.to_string(), "encode failed: encoder terminated by signal");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(PipelineError::transfer("x").kind(), "transfer_failure");
        assert_eq!(PipelineError::EncodeTimeout { secs: 5 }.kind(), "encode_timeout");
    }
}
