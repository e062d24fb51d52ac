//! User-initiated container lifecycle transitions
//!
//! Start and stop apply an optimistic sticky marker to the cache before the
//! remote command is issued, so readers see the transition immediately. The
//! marker is resolved by a later reconciliation pass, or rolled back here
//! when the command fails.

use crate::models::{ContainerRecord, STATE_STARTING, STATE_STOPPING};
use crate::observability::FleetMetrics;
use crate::runtime::{ContainerRuntime, RuntimeError};
use crate::store::ContainerStore;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Copy)]
enum Action {
    Start,
    Stop,
}

impl Action {
    /// Sticky state written to the cache while the command is in flight
    fn marker(self) -> &'static str {
        match self {
            Action::Start => STATE_STARTING,
            Action::Stop => STATE_STOPPING,
        }
    }

    /// Human-readable status shown until the runtime reports its own
    fn label(self) -> &'static str {
        match self {
            Action::Start => "Starting",
            Action::Stop => "Stopping",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

/// Issues start/stop commands with optimistic cache updates
pub struct LifecycleController {
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<ContainerStore>,
    metrics: FleetMetrics,
}

impl LifecycleController {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, store: Arc<ContainerStore>) -> Self {
        Self {
            runtime,
            store,
            metrics: FleetMetrics::new(),
        }
    }

    /// Start a container, returning before the transition completes
    pub async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.transition(id, Action::Start).await
    }

    /// Stop a container, returning before the transition completes
    pub async fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        self.transition(id, Action::Stop).await
    }

    async fn transition(&self, id: &str, action: Action) -> Result<(), RuntimeError> {
        let mut record = match self.store.get(id) {
            Some(record) => record,
            None => self.seed_record(id).await,
        };

        // Optimistic write, visible to readers before the command lands.
        record.state = action.marker().to_string();
        record.status = action.label().to_string();
        self.store.update(record.clone());

        let command = match action {
            Action::Start => self.runtime.start_container(id).await,
            Action::Stop => self.runtime.stop_container(id).await,
        };

        match command {
            Ok(()) => {
                // The next reconciliation pass picks up the final state.
                self.metrics.inc_lifecycle_command(action.name(), "ok");
                Ok(())
            }
            Err(error) => {
                warn!(container_id = %id, action = action.name(), error = %error, "Lifecycle command failed");
                self.metrics.inc_lifecycle_command(action.name(), "error");
                self.rollback(id, record).await;
                Err(error)
            }
        }
    }

    /// Replace the optimistic marker with the runtime's current view
    ///
    /// Best-effort: when the re-query fails too, the marker stays in place
    /// and ages out via TTL.
    async fn rollback(&self, id: &str, mut record: ContainerRecord) {
        match self.runtime.list_containers(true).await {
            Ok(listing) => {
                if let Some(summary) = listing.into_iter().find(|c| c.id == id) {
                    record.state = summary.state;
                    record.status = summary.status;
                    self.store.update(record);
                }
            }
            Err(error) => {
                debug!(container_id = %id, error = %error, "Rollback re-query failed, keeping marker");
            }
        }
    }

    /// Build a minimal record for a container the cache has never seen
    async fn seed_record(&self, id: &str) -> ContainerRecord {
        if let Ok(listing) = self.runtime.list_containers(true).await {
            if let Some(summary) = listing.into_iter().find(|c| c.id == id) {
                return ContainerRecord {
                    id: summary.id,
                    names: summary.names,
                    image: summary.image,
                    created: summary.created,
                    ..Default::default()
                };
            }
        }

        ContainerRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{STATE_EXITED, STATE_RUNNING};
    use crate::runtime::{async_trait, ContainerSummary, StatsSample};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock runtime with switchable command/listing failures
    struct MockRuntime {
        containers: Vec<ContainerSummary>,
        fail_commands: AtomicBool,
        fail_listing: AtomicBool,
        commands_issued: AtomicUsize,
    }

    impl MockRuntime {
        fn new(containers: Vec<ContainerSummary>) -> Self {
            Self {
                containers,
                fail_commands: AtomicBool::new(false),
                fail_listing: AtomicBool::new(false),
                commands_issued: AtomicUsize::new(0),
            }
        }

        fn command_error() -> RuntimeError {
            RuntimeError::Status {
                status: 500,
                message: "driver failure".to_string(),
            }
        }

        fn listing_error() -> RuntimeError {
            RuntimeError::Connect(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "daemon down",
            ))
        }
    }

    #[async_trait]
    impl ContainerRuntime for MockRuntime {
        async fn list_containers(
            &self,
            _include_stopped: bool,
        ) -> Result<Vec<ContainerSummary>, RuntimeError> {
            if self.fail_listing.load(Ordering::SeqCst) {
                return Err(Self::listing_error());
            }
            Ok(self.containers.clone())
        }

        async fn container_stats(&self, _id: &str) -> Result<StatsSample, RuntimeError> {
            Ok(StatsSample::default())
        }

        async fn start_container(&self, _id: &str) -> Result<(), RuntimeError> {
            self.commands_issued.fetch_add(1, Ordering::SeqCst);
            if self.fail_commands.load(Ordering::SeqCst) {
                return Err(Self::command_error());
            }
            Ok(())
        }

        async fn stop_container(&self, _id: &str) -> Result<(), RuntimeError> {
            self.commands_issued.fetch_add(1, Ordering::SeqCst);
            if self.fail_commands.load(Ordering::SeqCst) {
                return Err(Self::command_error());
            }
            Ok(())
        }
    }

    fn summary(id: &str, state: &str) -> ContainerSummary {
        ContainerSummary {
            id: id.to_string(),
            names: vec![format!("/{}", id)],
            image: "redis:7".to_string(),
            state: state.to_string(),
            status: "Exited (0) 2 minutes ago".to_string(),
            created: 1_700_000_100,
        }
    }

    fn controller(
        runtime: MockRuntime,
    ) -> (LifecycleController, Arc<ContainerStore>, Arc<MockRuntime>) {
        let runtime = Arc::new(runtime);
        let store = Arc::new(ContainerStore::new(Duration::from_secs(60)));
        let controller = LifecycleController::new(
            Arc::clone(&runtime) as Arc<dyn ContainerRuntime>,
            Arc::clone(&store),
        );
        (controller, store, runtime)
    }

    #[tokio::test]
    async fn test_start_writes_optimistic_marker() {
        let (controller, store, runtime) = controller(MockRuntime::new(vec![]));
        store.update(ContainerRecord {
            id: "web".to_string(),
            names: vec!["/web".to_string()],
            image: "nginx:latest".to_string(),
            state: STATE_EXITED.to_string(),
            status: "Exited (0)".to_string(),
            created: 42,
            stats: None,
        });

        controller.start("web").await.unwrap();

        let record = store.get("web").unwrap();
        assert_eq!(record.state, STATE_STARTING);
        assert_eq!(record.status, "Starting");
        // Known fields survive the optimistic write.
        assert_eq!(record.image, "nginx:latest");
        assert_eq!(record.created, 42);
        assert_eq!(runtime.commands_issued.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_seeds_from_runtime_when_uncached() {
        let (controller, store, _runtime) =
            controller(MockRuntime::new(vec![summary("db", STATE_EXITED)]));

        controller.start("db").await.unwrap();

        let record = store.get("db").unwrap();
        assert_eq!(record.state, STATE_STARTING);
        assert_eq!(record.names, vec!["/db"]);
        assert_eq!(record.image, "redis:7");
        assert_eq!(record.created, 1_700_000_100);
    }

    #[tokio::test]
    async fn test_start_unknown_container_uses_bare_id() {
        let runtime = MockRuntime::new(vec![]);
        runtime.fail_listing.store(true, Ordering::SeqCst);
        let (controller, store, _runtime) = controller(runtime);

        controller.start("ghost").await.unwrap();

        let record = store.get("ghost").unwrap();
        assert_eq!(record.id, "ghost");
        assert_eq!(record.state, STATE_STARTING);
        assert!(record.image.is_empty());
    }

    #[tokio::test]
    async fn test_rollback_on_command_failure() {
        let runtime = MockRuntime::new(vec![summary("web", STATE_EXITED)]);
        runtime.fail_commands.store(true, Ordering::SeqCst);
        let (controller, store, _runtime) = controller(runtime);

        let err = controller.start("web").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Status { status: 500, .. }));

        // The optimistic marker was replaced by the runtime-reported state.
        let record = store.get("web").unwrap();
        assert_eq!(record.state, STATE_EXITED);
        assert_eq!(record.status, "Exited (0) 2 minutes ago");
    }

    #[tokio::test]
    async fn test_marker_kept_when_rollback_requery_fails() {
        let runtime = MockRuntime::new(vec![summary("web", STATE_RUNNING)]);
        runtime.fail_commands.store(true, Ordering::SeqCst);
        let (controller, store, runtime) = controller(runtime);
        store.update(ContainerRecord {
            id: "web".to_string(),
            state: STATE_RUNNING.to_string(),
            ..Default::default()
        });

        // The rollback re-query cannot reach the runtime either.
        runtime.fail_listing.store(true, Ordering::SeqCst);
        assert!(controller.stop("web").await.is_err());

        assert_eq!(store.get("web").unwrap().state, STATE_STOPPING);
    }

    #[tokio::test]
    async fn test_second_call_overwrites_marker() {
        let (controller, store, _runtime) = controller(MockRuntime::new(vec![]));
        store.update(ContainerRecord {
            id: "web".to_string(),
            state: STATE_RUNNING.to_string(),
            ..Default::default()
        });

        controller.stop("web").await.unwrap();
        assert_eq!(store.get("web").unwrap().state, STATE_STOPPING);

        controller.start("web").await.unwrap();
        assert_eq!(store.get("web").unwrap().state, STATE_STARTING);
    }
}
