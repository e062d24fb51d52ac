//! Prometheus metrics for the cache engine
//!
//! Metrics register once into the default registry through a process-wide
//! `OnceLock`; [`FleetMetrics`] is a cheap cloneable handle. The server
//! exposes the registry at /metrics.

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use std::time::Duration;

/// Histogram buckets for sync pass latency (in seconds)
const SYNC_BUCKETS: &[f64] = &[0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

static GLOBAL_METRICS: OnceLock<FleetMetricsInner> = OnceLock::new();

struct FleetMetricsInner {
    sync_duration_seconds: Histogram,
    containers_tracked: IntGauge,
    sync_failures_total: IntCounter,
    stats_errors_total: IntCounter,
    lifecycle_commands_total: IntCounterVec,
}

impl FleetMetricsInner {
    fn new() -> Self {
        Self {
            sync_duration_seconds: register_histogram!(
                "fleetwatch_sync_duration_seconds",
                "Time spent on one full reconciliation pass",
                SYNC_BUCKETS.to_vec()
            )
            .expect("Failed to register sync_duration_seconds"),

            containers_tracked: register_int_gauge!(
                "fleetwatch_containers_tracked",
                "Number of containers currently held in the cache"
            )
            .expect("Failed to register containers_tracked"),

            sync_failures_total: register_int_counter!(
                "fleetwatch_sync_failures_total",
                "Total number of reconciliation passes aborted by a listing failure"
            )
            .expect("Failed to register sync_failures_total"),

            stats_errors_total: register_int_counter!(
                "fleetwatch_stats_errors_total",
                "Total number of per-container stats fetches that failed"
            )
            .expect("Failed to register stats_errors_total"),

            lifecycle_commands_total: register_int_counter_vec!(
                "fleetwatch_lifecycle_commands_total",
                "Start/stop commands issued, by action and outcome",
                &["action", "outcome"]
            )
            .expect("Failed to register lifecycle_commands_total"),
        }
    }
}

/// Handle to the process-wide metrics
#[derive(Clone, Default)]
pub struct FleetMetrics;

impl FleetMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(FleetMetricsInner::new);
        Self
    }

    fn inner(&self) -> &'static FleetMetricsInner {
        GLOBAL_METRICS.get_or_init(FleetMetricsInner::new)
    }

    pub fn observe_sync_duration(&self, elapsed: Duration) {
        self.inner()
            .sync_duration_seconds
            .observe(elapsed.as_secs_f64());
    }

    pub fn set_containers_tracked(&self, count: usize) {
        self.inner().containers_tracked.set(count as i64);
    }

    pub fn inc_sync_failures(&self) {
        self.inner().sync_failures_total.inc();
    }

    pub fn inc_stats_errors(&self) {
        self.inner().stats_errors_total.inc();
    }

    pub fn inc_lifecycle_command(&self, action: &str, outcome: &str) {
        self.inner()
            .lifecycle_commands_total
            .with_label_values(&[action, outcome])
            .inc();
    }
}
