//! Periodic sync driver
//!
//! Runs reconciliation passes at a fixed interval until a shutdown signal
//! arrives. Pass failures are recorded against health and metrics and
//! retried implicitly on the next tick; the loop itself never gives up.

use crate::health::SyncHealth;
use crate::observability::FleetMetrics;
use crate::service::FleetService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

/// Configuration for the periodic sync loop
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Time between reconciliation passes (default: 2 seconds)
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
        }
    }
}

/// Periodic driver for the reconciler
pub struct SyncLoop {
    service: Arc<FleetService>,
    config: SyncConfig,
    health: SyncHealth,
    metrics: FleetMetrics,
}

impl SyncLoop {
    pub fn new(service: Arc<FleetService>, config: SyncConfig, health: SyncHealth) -> Self {
        Self {
            service,
            config,
            health,
            metrics: FleetMetrics::new(),
        }
    }

    /// Run passes until the shutdown signal fires
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting sync loop"
        );

        let mut ticker = interval(self.config.interval);
        let mut pass_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let start = Instant::now();

                    match self.service.sync().await {
                        Ok(()) => {
                            self.health.record_success().await;
                            self.metrics.observe_sync_duration(start.elapsed());
                            self.metrics.set_containers_tracked(self.service.tracked_containers());
                        }
                        Err(error) => {
                            warn!(error = %error, "Sync pass failed");
                            self.health.record_failure(&error).await;
                            self.metrics.inc_sync_failures();
                        }
                    }

                    pass_count += 1;
                    if pass_count % 30 == 0 {
                        debug!(
                            passes = pass_count,
                            containers = self.service.tracked_containers(),
                            elapsed_ms = start.elapsed().as_millis(),
                            "Sync loop stats"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down sync loop");
                    break;
                }
            }
        }
    }
}
