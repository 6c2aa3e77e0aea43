//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How a worker claims a queued row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimMode {
    /// `UPDATE ... WHERE status = 'Queued'`; losing a race yields no row.
    #[default]
    Conditional,
    /// Plain read followed by an unconditional write. Two workers polling the same
    /// row can both process it.
    ReadThenWrite,
}

impl FromStr for ClaimMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conditional" => Ok(ClaimMode::Conditional),
            "read_then_write" => Ok(ClaimMode::ReadThenWrite),
            other => Err(format!("unknown claim mode: {}", other)),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Wait after an empty poll
    pub poll_interval: Duration,
    /// Wait after a job store error
    pub error_backoff: Duration,
    /// Scratch directory for job-scoped input/output files
    pub work_dir: PathBuf,
    /// Kill the encoder after this long; `None` waits indefinitely
    pub encode_timeout: Option<Duration>,
    /// Claim strategy
    pub claim_mode: ClaimMode,
    /// Health server bind host
    pub health_host: String,
    /// Health server bind port
    pub health_port: u16,
    /// Explicit FFmpeg binary; PATH lookup when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Retries for the final Done/Failed write
    pub status_write_retries: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            error_backoff: Duration::from_secs(5),
            work_dir: std::env::temp_dir(),
            encode_timeout: None,
            claim_mode: ClaimMode::Conditional,
            health_host: "0.0.0.0".to_string(),
            health_port: 8080,
            ffmpeg_path: None,
            status_write_retries: 3,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            poll_interval: Duration::from_secs(
                std::env::var("WORKER_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            error_backoff: Duration::from_secs(
                std::env::var("WORKER_ERROR_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            encode_timeout: std::env::var("WORKER_ENCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
            claim_mode: std::env::var("WORKER_CLAIM_MODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            health_host: std::env::var("WORKER_HEALTH_HOST").unwrap_or(defaults.health_host),
            health_port: std::env::var("WORKER_HEALTH_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            ffmpeg_path: std::env::var("FFMPEG_PATH").ok().map(PathBuf::from),
            status_write_retries: std::env::var("WORKER_STATUS_WRITE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }

    pub fn health_addr(&self) -> String {
        format!("{}:{}", self.health_host, self.health_port)
    }
}
