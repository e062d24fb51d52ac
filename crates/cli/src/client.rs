//! API client for the fleetwatchd server

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

/// HTTP client for the dashboard API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid server URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("server error ({}): {}", status, error_message(&body));
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with no body, expecting no content back
    pub async fn post(&self, path: &str) -> Result<()> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("server error ({}): {}", status, error_message(&body));
        }

        Ok(())
    }
}

/// Pull the message out of an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string())
}

// API response types

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerView {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub state: String,
    pub status: String,
    pub created: i64,
    pub stats: Option<StatsView>,
}

impl ContainerView {
    /// Canonical display name without the runtime's leading slash
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|name| name.trim_start_matches('/'))
            .unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsView {
    pub memory: MemoryView,
    pub cpu: CpuView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryView {
    pub usage: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuView {
    pub usage_percent: f64,
    pub cores: u32,
    pub system_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
