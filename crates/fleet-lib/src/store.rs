//! TTL-keyed in-memory store for container records
//!
//! The store is the single shared mutable resource of the cache engine. It
//! supports concurrent readers and serialized writers via a sharded map, and
//! hides entries whose last write is older than the configured TTL even
//! before they are physically purged.

use crate::models::{ContainerRecord, ResourceStats, STATE_EXITED};
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// One cache slot: the record plus its staleness clock
struct Entry {
    record: ContainerRecord,
    updated_at: Instant,
}

/// In-memory container cache with TTL-based staleness
pub struct ContainerStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl ContainerStore {
    /// Create a store whose entries expire `ttl` after their last write
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Insert or replace the record for `record.id`
    ///
    /// Stats stored on an existing entry are carried forward onto the new
    /// record unless the incoming state is `exited`, which clears them.
    /// Every call refreshes the entry's staleness clock.
    pub fn update(&self, mut record: ContainerRecord) {
        let prior_stats = self
            .entries
            .get(&record.id)
            .map(|entry| entry.record.stats.clone());

        if record.state == STATE_EXITED {
            record.stats = None;
        } else if let Some(stats) = prior_stats {
            record.stats = stats;
        }

        self.entries.insert(
            record.id.clone(),
            Entry {
                record,
                updated_at: Instant::now(),
            },
        );
    }

    /// Merge stats into an existing entry and refresh its staleness clock
    ///
    /// Returns false without effect when no entry exists for `id`. A
    /// stats-only write counts as an alive signal just like a full update.
    pub fn update_stats(&self, id: &str, stats: ResourceStats) -> bool {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.record.stats = Some(stats);
                entry.updated_at = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Return the record for `id`, or None when absent or stale
    pub fn get(&self, id: &str) -> Option<ContainerRecord> {
        self.entries.get(id).and_then(|entry| {
            if entry.updated_at.elapsed() > self.ttl {
                None
            } else {
                Some(entry.record.clone())
            }
        })
    }

    /// Return all fresh records in unspecified order
    pub fn list(&self) -> Vec<ContainerRecord> {
        self.entries
            .iter()
            .filter(|entry| entry.updated_at.elapsed() <= self.ttl)
            .map(|entry| entry.record.clone())
            .collect()
    }

    /// Physically remove every entry older than the TTL
    pub fn purge_stale(&self) {
        self.entries
            .retain(|_, entry| entry.updated_at.elapsed() <= self.ttl);
    }

    /// Number of entries in storage, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
