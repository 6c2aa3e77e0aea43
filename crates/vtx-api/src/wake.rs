//! Worker wake probe.

use std::time::Duration;

use tracing::debug;
use vtx_models::WakeStatus;

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Bounded-time call to the worker's health endpoint.
#[derive(Debug, Clone)]
pub struct WakeProbe {
    http: reqwest::Client,
    health_url: String,
}

impl WakeProbe {
    pub fn new(worker_url: &str, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build wake probe client: {}", e)))?;

        Ok(Self {
            http,
            health_url: format!("{}/health", worker_url.trim_end_matches('/')),
        })
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    /// `Awake` on any 2xx, `Asleep` on everything else. Never fails.
    pub async fn probe(&self) -> WakeStatus {
        let status = match self.http.get(&self.health_url).send().await {
            Ok(resp) if resp.status().is_success() => WakeStatus::Awake,
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), "Worker health check not OK");
                WakeStatus::Asleep
            }
            Err(e) => {
                debug!("Worker unreachable: {}", e);
                WakeStatus::Asleep
            }
        };

        metrics::record_wake_probe(status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_url_joins_cleanly() {
        let probe = WakeProbe::new("http://worker:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.health_url(), "http://worker:8080/health");
    }
}
