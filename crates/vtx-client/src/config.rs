//! Client configuration.

use std::time::Duration;

/// Edge API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Edge API base URL
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Interval for wake probes and job status polls
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(3),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("VTX_API_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("VTX_CLIENT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            poll_interval: std::env::var("VTX_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
        }
    }
}
