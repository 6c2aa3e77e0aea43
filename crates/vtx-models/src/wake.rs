//! Worker liveness states.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of probing the worker's health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WakeStatus {
    /// Worker answered its health check
    Awake,
    /// Timeout, refused connection, or non-OK response
    Asleep,
}

/// Display state derived on the client from repeated wake probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Probing, worker not confirmed yet
    #[default]
    Waking,
    /// Worker reachable; polling has stopped
    Awake,
    /// Last probe request itself failed; polling continues
    Error,
}

impl WorkerStatus {
    pub fn is_awake(&self) -> bool {
        matches!(self, WorkerStatus::Awake)
    }
}

impl From<WakeStatus> for WorkerStatus {
    fn from(status: WakeStatus) -> Self {
        match status {
            WakeStatus::Awake => WorkerStatus::Awake,
            WakeStatus::Asleep => WorkerStatus::Waking,
        }
    }
}
