//! Resource stats enrichment for running containers
//!
//! Fetches one-shot samples from the runtime concurrently, derives display
//! values from the raw counters, and merges them into the store. A failed
//! fetch for one container never fails the cycle; that container simply
//! keeps its previous stats.

use crate::models::{CpuStats, MemoryStats, ResourceStats};
use crate::observability::FleetMetrics;
use crate::runtime::{ContainerRuntime, StatsSample};
use crate::store::ContainerStore;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// Upper bound on in-flight stats fetches per cycle
const DEFAULT_CONCURRENCY: usize = 16;

/// Concurrent per-container stats fetcher
pub struct StatsEnricher {
    runtime: Arc<dyn ContainerRuntime>,
    concurrency: usize,
    metrics: FleetMetrics,
}

impl StatsEnricher {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            concurrency: DEFAULT_CONCURRENCY,
            metrics: FleetMetrics::new(),
        }
    }

    /// Cap the number of concurrent fetches per cycle
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch and merge stats for `ids`, joining all fetches before returning
    pub async fn enrich(&self, store: &Arc<ContainerStore>, ids: Vec<String>) {
        let mut tasks = JoinSet::new();

        for id in ids {
            if tasks.len() >= self.concurrency {
                tasks.join_next().await;
            }

            let runtime = Arc::clone(&self.runtime);
            let store = Arc::clone(store);
            let metrics = self.metrics.clone();
            tasks.spawn(async move {
                match runtime.container_stats(&id).await {
                    Ok(sample) => {
                        let prior = store.get(&id).and_then(|record| record.stats);
                        let stats = resource_stats_from_sample(&sample, prior.as_ref());
                        store.update_stats(&id, stats);
                    }
                    Err(error) => {
                        metrics.inc_stats_errors();
                        debug!(container_id = %id, error = %error, "Failed to fetch container stats");
                    }
                }
            });
        }

        while tasks.join_next().await.is_some() {}
    }
}

/// Derive display stats from a raw runtime sample
///
/// CPU usage is the share of system CPU time the container consumed between
/// the sample's previous and current counters, scaled by the online core
/// count and truncated to two decimals. When either delta is non-positive
/// the percentage keeps its prior cached value.
pub fn resource_stats_from_sample(
    sample: &StatsSample,
    prior: Option<&ResourceStats>,
) -> ResourceStats {
    let cpu_delta = sample
        .cpu_stats
        .cpu_usage
        .total_usage
        .checked_sub(sample.precpu_stats.cpu_usage.total_usage)
        .unwrap_or(0);
    let system_delta = sample
        .cpu_stats
        .system_cpu_usage
        .checked_sub(sample.precpu_stats.system_cpu_usage)
        .unwrap_or(0);

    let usage_percent = if cpu_delta > 0 && system_delta > 0 {
        let cores = match sample.cpu_stats.online_cpus {
            0 => 1.0,
            n => n as f64,
        };
        let percent = (cpu_delta as f64 / system_delta as f64) * 100.0 * cores;
        (percent * 100.0).trunc() / 100.0
    } else {
        prior.map(|stats| stats.cpu.usage_percent).unwrap_or(0.0)
    };

    ResourceStats {
        memory: MemoryStats {
            usage: sample.memory_stats.usage,
            limit: sample.memory_stats.limit,
        },
        cpu: CpuStats {
            usage_percent,
            cores: sample.cpu_stats.online_cpus,
            system_ms: sample.cpu_stats.system_cpu_usage / 1_000_000,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(total: u64, pre_total: u64, system: u64, pre_system: u64, cores: u32) -> StatsSample {
        let mut sample = StatsSample::default();
        sample.cpu_stats.cpu_usage.total_usage = total;
        sample.precpu_stats.cpu_usage.total_usage = pre_total;
        sample.cpu_stats.system_cpu_usage = system;
        sample.precpu_stats.system_cpu_usage = pre_system;
        sample.cpu_stats.online_cpus = cores;
        sample
    }

    #[test]
    fn test_cpu_percent_scaled_by_cores() {
        // 200 of 1000 units across 4 cores -> 80%.
        let stats = resource_stats_from_sample(&sample(1200, 1000, 2000, 1000, 4), None);
        assert_eq!(stats.cpu.usage_percent, 80.0);
        assert_eq!(stats.cpu.cores, 4);
    }

    #[test]
    fn test_cpu_percent_truncated_to_two_decimals() {
        // 12345 / 1_000_000 * 100 = 1.2345 -> 1.23.
        let stats = resource_stats_from_sample(&sample(12_345, 0, 1_000_000, 0, 1), None);
        assert_eq!(stats.cpu.usage_percent, 1.23);
    }

    #[test]
    fn test_zero_cores_defaults_to_one() {
        let stats = resource_stats_from_sample(&sample(500, 0, 1000, 0, 0), None);
        assert_eq!(stats.cpu.usage_percent, 50.0);
        assert_eq!(stats.cpu.cores, 0);
    }

    #[test]
    fn test_zero_system_delta_keeps_prior_percent() {
        let prior = ResourceStats {
            cpu: CpuStats {
                usage_percent: 55.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let stats = resource_stats_from_sample(&sample(500, 0, 1000, 1000, 2), Some(&prior));
        assert_eq!(stats.cpu.usage_percent, 55.5);
    }

    #[test]
    fn test_counter_regression_treated_as_skip() {
        // Counters moving backwards (daemon restart) must not panic or
        // produce a bogus percentage.
        let stats = resource_stats_from_sample(&sample(100, 500, 900, 1000, 2), None);
        assert_eq!(stats.cpu.usage_percent, 0.0);
    }

    #[test]
    fn test_memory_and_system_ms_copied() {
        let mut raw = sample(0, 0, 3_500_000_000, 0, 2);
        raw.memory_stats.usage = 512 * 1024;
        raw.memory_stats.limit = 2048 * 1024;

        let stats = resource_stats_from_sample(&raw, None);
        assert_eq!(stats.memory.usage, 512 * 1024);
        assert_eq!(stats.memory.limit, 2048 * 1024);
        // Nanoseconds to milliseconds.
        assert_eq!(stats.cpu.system_ms, 3_500);
    }
}
