//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the dashboard API
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Path to the container runtime socket
    #[serde(default = "default_docker_socket")]
    pub docker_socket: String,

    /// Seconds between reconciliation passes
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Seconds an unrefreshed cache entry stays visible
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Cap on concurrent stats fetches per pass
    #[serde(default = "default_stats_concurrency")]
    pub stats_concurrency: usize,
}

fn default_listen_port() -> u16 {
    4242
}

fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

fn default_sync_interval() -> u64 {
    2
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_stats_concurrency() -> usize {
    16
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            docker_socket: default_docker_socket(),
            sync_interval_secs: default_sync_interval(),
            cache_ttl_secs: default_cache_ttl(),
            stats_concurrency: default_stats_concurrency(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from FLEETWATCH_* environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("FLEETWATCH"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
