//! State reconciliation against the container runtime
//!
//! One pass merges a full listing into the cache while respecting in-flight
//! start/stop transitions, enriches running containers with stats, and
//! purges stale entries. The periodic driver lives in [`SyncLoop`].

mod r#loop;


pub use r#loop::{SyncConfig, SyncLoop};

use crate::models::{ContainerRecord, STATE_EXITED, STATE_RUNNING, STATE_STARTING, STATE_STOPPING};
use crate::runtime::{ContainerRuntime, ContainerSummary, RuntimeError};
use crate::stats::StatsEnricher;
use crate::store::ContainerStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Orchestrates one cache synchronization pass
pub struct Reconciler {
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<ContainerStore>,
    enricher: StatsEnricher,
}

impl Reconciler {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, store: Arc<ContainerStore>) -> Self {
        let enricher = StatsEnricher::new(Arc::clone(&runtime));
        Self {
            runtime,
            store,
            enricher,
        }
    }

    /// Replace the default stats enricher, e.g. to change its concurrency cap
    pub fn with_enricher(mut self, enricher: StatsEnricher) -> Self {
        self.enricher = enricher;
        self
    }

    /// Run one reconciliation pass
    ///
    /// A listing failure aborts the pass with no cache mutation. Everything
    /// after the listing is best-effort: individual stats fetches may fail
    /// without failing the pass.
    pub async fn sync_once(&self) -> Result<(), RuntimeError> {
        let listing = self.runtime.list_containers(true).await?;

        let by_id: HashMap<&str, &ContainerSummary> =
            listing.iter().map(|c| (c.id.as_str(), c)).collect();

        self.resolve_transitions(&by_id);
        self.merge_listing(&listing);

        let running: Vec<String> = listing
            .iter()
            .filter(|c| c.state == STATE_RUNNING)
            .map(|c| c.id.clone())
            .collect();
        self.enricher.enrich(&self.store, running).await;

        self.store.purge_stale();
        Ok(())
    }

    /// Complete sticky start/stop markers confirmed by the fresh listing
    ///
    /// `starting` completes once the runtime reports the container running,
    /// `stopping` once it reports it exited. A container that disappeared
    /// from the listing keeps its marker and ages out via TTL.
    fn resolve_transitions(&self, by_id: &HashMap<&str, &ContainerSummary>) {
        for cached in self.store.list() {
            let confirmed_state = match cached.state.as_str() {
                STATE_STARTING => STATE_RUNNING,
                STATE_STOPPING => STATE_EXITED,
                _ => continue,
            };

            if let Some(summary) = by_id.get(cached.id.as_str()) {
                if summary.state == confirmed_state {
                    self.store.update(ContainerRecord::from((*summary).clone()));
                }
            }
        }
    }

    /// Overwrite every non-sticky cache entry with the fresh listing
    fn merge_listing(&self, listing: &[ContainerSummary]) {
        for summary in listing {
            if let Some(cached) = self.store.get(&summary.id) {
                if cached.state == STATE_STARTING || cached.state == STATE_STOPPING {
                    continue;
                }
            }
            self.store.update(ContainerRecord::from(summary.clone()));
        }
    }
}
