//! HTTP client for the fleet metrics API.
//!
//! Two endpoints are consumed: per-host health checks and remote
//! agent installation. Both are thin JSON calls; the API itself is
//! owned elsewhere.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleet_core::config::ApiConfig;
use fleet_core::Hostname;

/// Metrics API failures
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request-level failure (connect, timeout, decode)
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned {code}: {message}")]
    Status { code: u16, message: String },
}

/// Health verdict for one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Online,
    Offline,
}

impl HealthStatus {
    /// Render for tables and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Online => "online",
            HealthStatus::Offline => "offline",
        }
    }
}

/// One host's health as reported by the API
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub hostname: String,
    pub status: HealthStatus,
    /// When the host last reported in, if it ever has
    #[serde(default)]
    pub last_seen: Option<String>,
}

#[derive(Serialize)]
struct InstallRequest<'a> {
    ip_address: &'a str,
    user: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct InstallResponse {
    output: String,
}

/// Client for the fleet metrics API
#[derive(Debug, Clone)]
pub struct MetricsApi {
    base_url: String,
    http: reqwest::Client,
}

impl MetricsApi {
    /// Build a client from API settings
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Query one host's health
    pub async fn health(&self, hostname: &Hostname) -> Result<HealthReport, ApiError> {
        let url = format!("{}/healthcheck/{}", self.base_url, hostname);
        tracing::debug!(%url, "health check");

        let response = self.http.get(&url).send().await?;
        Self::check_status(&response).await?;
        Ok(response.json().await?)
    }

    /// Install the fleet agent on a machine, returning installer
    /// output
    pub async fn install(&self, ip: &str, user: &str, password: &str) -> Result<String, ApiError> {
        let url = format!("{}/add-host", self.base_url);
        tracing::info!(%ip, %user, "requesting agent installation");

        let response = self
            .http
            .post(&url)
            .json(&InstallRequest {
                ip_address: ip,
                user,
                password,
            })
            .send()
            .await?;
        Self::check_status(&response).await?;

        let body: InstallResponse = response.json().await?;
        Ok(body.output)
    }

    async fn check_status(response: &reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ApiError::Status {
            code: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        })
    }
}
