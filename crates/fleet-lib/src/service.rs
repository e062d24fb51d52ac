//! Facade over the cache engine
//!
//! Bundles the store, reconciler and lifecycle controller behind the small
//! surface the HTTP layer consumes: sync, a display-sorted listing, point
//! lookups and start/stop.

use crate::lifecycle::LifecycleController;
use crate::models::{ContainerRecord, STATE_EXITED, STATE_RUNNING, STATE_STARTING, STATE_STOPPING};
use crate::runtime::{ContainerRuntime, RuntimeError};
use crate::stats::StatsEnricher;
use crate::store::ContainerStore;
use crate::sync::Reconciler;
use std::cmp::Ordering;
use std::sync::Arc;

/// Entry point for consumers of the container cache
pub struct FleetService {
    store: Arc<ContainerStore>,
    reconciler: Reconciler,
    lifecycle: LifecycleController,
}

impl FleetService {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, store: Arc<ContainerStore>) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&runtime), Arc::clone(&store));
        let lifecycle = LifecycleController::new(Arc::clone(&runtime), Arc::clone(&store));
        Self {
            store,
            reconciler,
            lifecycle,
        }
    }

    /// Create a service with a custom cap on concurrent stats fetches
    pub fn with_stats_concurrency(
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<ContainerStore>,
        concurrency: usize,
    ) -> Self {
        let enricher = StatsEnricher::new(Arc::clone(&runtime)).with_concurrency(concurrency);
        let reconciler =
            Reconciler::new(Arc::clone(&runtime), Arc::clone(&store)).with_enricher(enricher);
        let lifecycle = LifecycleController::new(Arc::clone(&runtime), Arc::clone(&store));
        Self {
            store,
            reconciler,
            lifecycle,
        }
    }

    /// Run one reconciliation pass
    pub async fn sync(&self) -> Result<(), RuntimeError> {
        self.reconciler.sync_once().await
    }

    /// All fresh records in display order
    pub fn list(&self) -> Vec<ContainerRecord> {
        let mut records = self.store.list();
        sort_records(&mut records);
        records
    }

    /// Look up one record, None when unknown or stale
    pub fn get(&self, id: &str) -> Option<ContainerRecord> {
        self.store.get(id)
    }

    /// Start a container (optimistic, resolved by a later pass)
    pub async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.lifecycle.start(id).await
    }

    /// Stop a container (optimistic, resolved by a later pass)
    pub async fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        self.lifecycle.stop(id).await
    }

    /// Number of cache entries, for the metrics gauge
    pub fn tracked_containers(&self) -> usize {
        self.store.len()
    }
}

/// Sort records for display
///
/// Running containers first, then stopping, starting, exited, everything
/// else. Ties break by memory usage descending (records with stats ahead of
/// records without), then by creation time descending.
pub fn sort_records(records: &mut [ContainerRecord]) {
    records.sort_by(compare_records);
}

fn compare_records(a: &ContainerRecord, b: &ContainerRecord) -> Ordering {
    state_priority(&a.state)
        .cmp(&state_priority(&b.state))
        .then_with(|| match (&a.stats, &b.stats) {
            (Some(a_stats), Some(b_stats)) => b_stats.memory.usage.cmp(&a_stats.memory.usage),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created.cmp(&a.created))
}

fn state_priority(state: &str) -> u8 {
    match state {
        STATE_RUNNING => 0,
        STATE_STOPPING => 1,
        STATE_STARTING => 2,
        STATE_EXITED => 3,
        _ => 4,
    }
}
