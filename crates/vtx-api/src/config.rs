//! API configuration.

use std::time::Duration;

use vtx_models::{UploadPolicy, DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_UPLOAD_BYTES};
use vtx_storage::{RESULT_URL_TTL, UPLOAD_URL_TTL};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
    /// Base URL of the worker; the wake probe calls `{worker_url}/health`
    pub worker_url: String,
    /// Upper bound on one wake probe
    pub wake_timeout: Duration,
    /// Size limit and MIME allow-list for upload URLs
    pub upload_policy: UploadPolicy,
    /// Owner assigned to jobs created without a `userId`
    pub default_user_id: Option<String>,
    /// Validity of presigned PUT URLs
    pub upload_url_ttl: Duration,
    /// Validity of presigned result GET URLs
    pub result_url_ttl: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Serve Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            worker_url: "http://localhost:8080".to_string(),
            wake_timeout: Duration::from_secs(5),
            upload_policy: UploadPolicy::default(),
            default_user_id: None,
            upload_url_ttl: UPLOAD_URL_TTL,
            result_url_ttl: RESULT_URL_TTL,
            max_body_size: 64 * 1024,
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let allowed_types = std::env::var("UPLOAD_ALLOWED_TYPES")
            .map(|s| split_list(&s))
            .unwrap_or_else(|_| DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect());

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("ALLOWED_ORIGIN")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.cors_origins),
            worker_url: std::env::var("WORKER_URL").unwrap_or(defaults.worker_url),
            wake_timeout: env_secs("WAKE_TIMEOUT_SECS").unwrap_or(defaults.wake_timeout),
            upload_policy: UploadPolicy::new(
                std::env::var("UPLOAD_MAX_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
                allowed_types,
            ),
            default_user_id: std::env::var("DEFAULT_USER_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            upload_url_ttl: env_secs("UPLOAD_URL_TTL_SECS").unwrap_or(defaults.upload_url_ttl),
            result_url_ttl: env_secs("RESULT_URL_TTL_SECS").unwrap_or(defaults.result_url_ttl),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
