//! Sync health tracking
//!
//! The dashboard is only as good as its last reconciliation pass, so health
//! is defined in those terms: healthy after a successful pass, degraded
//! while failures accumulate, unhealthy once the runtime has been
//! unreachable for several passes in a row (or before the first pass ever
//! completes).

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive failures before health turns unhealthy
const FAILURE_THRESHOLD: u32 = 5;

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The last pass succeeded
    Healthy,
    /// Recent passes failed but the cache is still serving
    Degraded,
    /// The runtime looks unreachable
    Unhealthy,
}

/// Health snapshot served at /healthz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_timestamp: Option<i64>,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct HealthState {
    last_success_timestamp: Option<i64>,
    consecutive_failures: u32,
    last_error: Option<String>,
}

/// Shared tracker updated by the sync loop
#[derive(Debug, Clone, Default)]
pub struct SyncHealth {
    state: Arc<RwLock<HealthState>>,
}

impl SyncHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful pass, clearing any failure streak
    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        state.last_success_timestamp = Some(chrono::Utc::now().timestamp());
        state.consecutive_failures = 0;
        state.last_error = None;
    }

    /// Record a failed pass
    pub async fn record_failure(&self, error: impl Display) {
        let mut state = self.state.write().await;
        state.consecutive_failures += 1;
        state.last_error = Some(error.to_string());
    }

    /// Current health snapshot
    pub async fn report(&self) -> HealthReport {
        let state = self.state.read().await;

        let status = if state.consecutive_failures >= FAILURE_THRESHOLD {
            HealthStatus::Unhealthy
        } else if state.consecutive_failures > 0 || state.last_success_timestamp.is_none() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            last_sync_timestamp: state.last_success_timestamp,
            consecutive_failures: state.consecutive_failures,
            last_error: state.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_degraded_before_first_pass() {
        let health = SyncHealth::new();
        let report = health.report().await;

        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(report.last_sync_timestamp.is_none());
    }

    #[tokio::test]
    async fn test_healthy_after_success() {
        let health = SyncHealth::new();
        health.record_success().await;

        let report = health.report().await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.last_sync_timestamp.is_some());
        assert_eq!(report.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_failures_escalate_to_unhealthy() {
        let health = SyncHealth::new();
        health.record_success().await;

        health.record_failure("connection refused").await;
        assert_eq!(health.report().await.status, HealthStatus::Degraded);

        for _ in 0..FAILURE_THRESHOLD {
            health.record_failure("connection refused").await;
        }
        let report = health.report().await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.last_error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let health = SyncHealth::new();
        for _ in 0..10 {
            health.record_failure("boom").await;
        }
        health.record_success().await;

        let report = health.report().await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.consecutive_failures, 0);
        assert!(report.last_error.is_none());
    }
}
