//! Core library for the Fleetwatch container dashboard
//!
//! This crate provides:
//! - A TTL cache of container records with sticky lifecycle transitions
//! - Reconciliation of the cache against the runtime's full listings
//! - Concurrent resource stats enrichment for running containers
//! - Optimistic start/stop with best-effort rollback
//! - Sync health tracking and Prometheus metrics

pub mod health;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod runtime;
pub mod service;
pub mod stats;
pub mod store;
pub mod sync;

pub use health::{HealthReport, HealthStatus, SyncHealth};
pub use models::*;
pub use observability::FleetMetrics;
pub use runtime::{ContainerRuntime, DockerRuntime, RuntimeError};
pub use service::FleetService;
pub use store::ContainerStore;
pub use sync::{Reconciler, SyncConfig, SyncLoop};
