//! Access to the container runtime API
//!
//! The cache engine never talks to the runtime directly; it goes through the
//! [`ContainerRuntime`] trait so the reconciler and lifecycle controller can
//! be driven by a test double. The production implementation speaks the
//! Docker Engine API over the local Unix socket.

mod docker;

pub use docker::DockerRuntime;

use crate::models::ContainerRecord;
use serde::Deserialize;
use thiserror::Error;

pub use async_trait::async_trait;

/// Failure modes of a runtime call
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to connect to container runtime: {0}")]
    Connect(#[source] std::io::Error),
    #[error("runtime request failed: {0}")]
    Transport(#[source] std::io::Error),
    #[error("malformed runtime response: {0}")]
    Protocol(String),
    #[error("runtime returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode runtime response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One container as reported by the runtime listing
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names")]
    pub names: Vec<String>,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Created")]
    pub created: i64,
}

impl From<ContainerSummary> for ContainerRecord {
    fn from(summary: ContainerSummary) -> Self {
        ContainerRecord {
            id: summary.id,
            names: summary.names,
            image: summary.image,
            state: summary.state,
            status: summary.status,
            created: summary.created,
            stats: None,
        }
    }
}

/// One-shot resource sample for a container
///
/// The runtime supplies both the current and the previous cumulative CPU
/// counters in a single response, so no local history is needed to compute
/// per-interval usage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsSample {
    #[serde(default)]
    pub cpu_stats: CpuSample,
    #[serde(default)]
    pub precpu_stats: PreCpuSample,
    #[serde(default)]
    pub memory_stats: MemorySample,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuSample {
    #[serde(default)]
    pub cpu_usage: CpuUsageSample,
    #[serde(default)]
    pub system_cpu_usage: u64,
    #[serde(default)]
    pub online_cpus: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreCpuSample {
    #[serde(default)]
    pub cpu_usage: CpuUsageSample,
    #[serde(default)]
    pub system_cpu_usage: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuUsageSample {
    #[serde(default)]
    pub total_usage: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemorySample {
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub limit: u64,
}

/// Trait for container runtime implementations
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List containers known to the runtime
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Fetch a one-shot resource sample for a container
    async fn container_stats(&self, id: &str) -> Result<StatsSample, RuntimeError>;

    /// Start a container
    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Stop a container
    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError>;
}
