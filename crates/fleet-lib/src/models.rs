//! Core data models for the container fleet cache

use serde::{Deserialize, Serialize};

/// Container state reported by the runtime for a running container
pub const STATE_RUNNING: &str = "running";
/// Container state reported by the runtime once a container has stopped
pub const STATE_EXITED: &str = "exited";
/// Locally assigned marker while a start command is in flight
pub const STATE_STARTING: &str = "starting";
/// Locally assigned marker while a stop command is in flight
pub const STATE_STOPPING: &str = "stopping";

/// Cached view of a single container
///
/// Built from the runtime's listing and enriched with resource stats. The
/// staleness clock lives next to the record inside the store and is never
/// part of the serialized payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    /// Display names, first entry is canonical
    pub names: Vec<String>,
    pub image: String,
    pub state: String,
    /// Free-text status string for display ("Up 3 hours", "Starting", ...)
    pub status: String,
    /// Creation time as unix seconds, immutable per container
    pub created: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ResourceStats>,
}

/// Point-in-time resource usage for a running container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub memory: MemoryStats,
    pub cpu: CpuStats,
}

/// Memory usage in bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub usage: u64,
    pub limit: u64,
}

/// Derived CPU usage for one sampling interval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    /// CPU time used during the interval, scaled by core count (0-100+)
    pub usage_percent: f64,
    /// Online core count reported by the runtime
    pub cores: u32,
    /// Cumulative system CPU time in milliseconds
    pub system_ms: u64,
}
