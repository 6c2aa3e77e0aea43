//! PostgREST client for the `jobs` table.
//!
//! Talks to a Supabase project (or any PostgREST server) with the service-role
//! key. Every request is wrapped in a tracing span and recorded in metrics.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info_span, Instrument};
use vtx_models::{Job, JobId, JobStatus, NewJob};

use crate::error::{JobStoreError, JobStoreResult};
use crate::metrics::record_request;
use crate::store::{JobStore, JobUpdate};

// =============================================================================
// Configuration
// =============================================================================

/// PostgREST client configuration.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Service-role key, sent as `apikey` and bearer token
    pub service_key: String,
    /// Table holding job rows
    pub table: String,
    /// Request timeout
    pub timeout: Duration,
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            table: "jobs".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> JobStoreResult<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| JobStoreError::config_error("SUPABASE_URL not set"))?;
        if base_url.is_empty() {
            return Err(JobStoreError::config_error("SUPABASE_URL cannot be empty"));
        }

        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| JobStoreError::config_error("SUPABASE_SERVICE_ROLE_KEY not set"))?;

        let table = std::env::var("JOB_STORE_TABLE").unwrap_or_else(|_| "jobs".to_string());

        let timeout_secs: u64 = std::env::var("JOB_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            base_url,
            service_key,
            table,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Job store backed by a PostgREST endpoint.
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    config: PostgrestConfig,
}

impl PostgrestClient {
    pub fn new(config: PostgrestConfig) -> JobStoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> JobStoreResult<Self> {
        Self::new(PostgrestConfig::from_env()?)
    }

    pub fn config(&self) -> &PostgrestConfig {
        &self.config
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    /// Read a row array from a successful response.
    async fn read_rows(response: reqwest::Response) -> JobStoreResult<Vec<Job>> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, response).await);
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| JobStoreError::invalid_response(format!("{}: {}", e, body)))
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, fut: F) -> JobStoreResult<T>
    where
        F: std::future::Future<Output = JobStoreResult<T>>,
    {
        let span = info_span!("jobstore_request", operation = %operation, table = %self.config.table);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> JobStoreError {
        let body = response.text().await.unwrap_or_default();
        JobStoreError::from_http_status(status.as_u16(), body)
    }
}

#[async_trait]
impl JobStore for PostgrestClient {
    async fn insert(&self, job: NewJob) -> JobStoreResult<Job> {
        let url = self.table_url();

        self.execute_request("insert", async {
            let response = self
                .authed(self.http.post(&url))
                .header("Prefer", "return=representation")
                .json(&job)
                .send()
                .await?;

            let mut rows = Self::read_rows(response).await?;
            let inserted = rows
                .pop()
                .ok_or_else(|| JobStoreError::invalid_response("insert returned no row"))?;
            debug!(job_id = %inserted.id, "Inserted job");
            Ok(inserted)
        })
        .await
    }

    async fn get(&self, id: &JobId) -> JobStoreResult<Option<Job>> {
        let url = self.table_url();
        let filter = format!("eq.{}", id);

        self.execute_request("get", async {
            let response = self
                .authed(self.http.get(&url))
                .query(&[("select", "*"), ("id", filter.as_str()), ("limit", "1")])
                .send()
                .await?;

            Ok(Self::read_rows(response).await?.into_iter().next())
        })
        .await
    }

    async fn find_queued(&self) -> JobStoreResult<Option<Job>> {
        let url = self.table_url();
        let filter = format!("eq.{}", JobStatus::Queued);

        self.execute_request("find_queued", async {
            let response = self
                .authed(self.http.get(&url))
                .query(&[("select", "*"), ("status", filter.as_str()), ("limit", "1")])
                .send()
                .await?;

            Ok(Self::read_rows(response).await?.into_iter().next())
        })
        .await
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> JobStoreResult<Option<Job>> {
        let url = self.table_url();
        let mut filters = vec![("id", format!("eq.{}", id))];
        if let Some(expected) = update.expected_status {
            filters.push(("status", format!("eq.{}", expected)));
        }

        self.execute_request("update", async {
            let response = self
                .authed(self.http.patch(&url))
                .header("Prefer", "return=representation")
                .query(&filters)
                .json(&update)
                .send()
                .await?;

            let updated = Self::read_rows(response).await?.into_iter().next();
            if updated.is_none() {
                debug!(job_id = %id, status = %update.status, "Update matched no row");
            }
            Ok(updated)
        })
        .await
    }

    async fn list_by_user(&self, user_id: &str) -> JobStoreResult<Vec<Job>> {
        let url = self.table_url();
        let filter = format!("eq.{}", user_id);

        self.execute_request("list_by_user", async {
            let response = self
                .authed(self.http.get(&url))
                .query(&[
                    ("select", "*"),
                    ("user_id", filter.as_str()),
                    ("order", "created_at.desc"),
                ])
                .send()
                .await?;

            Self::read_rows(response).await
        })
        .await
    }

    async fn ping(&self) -> JobStoreResult<()> {
        let url = self.table_url();

        self.execute_request("ping", async {
            let response = self
                .authed(self.http.get(&url))
                .query(&[("select", "id"), ("limit", "1")])
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(Self::handle_error_response(status, response).await)
            }
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_requires_url() {
        std::env::remove_var("SUPABASE_URL");
        assert!(PostgrestConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        std::env::set_var("SUPABASE_URL", "https://example.supabase.co");
        std::env::set_var("SUPABASE_SERVICE_ROLE_KEY", "service-key");
        std::env::remove_var("JOB_STORE_TABLE");
        std::env::remove_var("JOB_STORE_TIMEOUT_SECS");

        let config = PostgrestConfig::from_env().unwrap();
        assert_eq!(config.table, "jobs");
        assert_eq!(config.timeout, Duration::from_secs(10));

        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_SERVICE_ROLE_KEY");
    }

    #[test]
    fn test_table_url_trims_slash() {
        let client = PostgrestClient::new(PostgrestConfig::new("http://localhost:54321/", "k")).unwrap();
        assert_eq!(client.table_url(), "http://localhost:54321/rest/v1/jobs");
    }
}
