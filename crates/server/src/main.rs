//! Fleetwatch server - local container dashboard
//!
//! Polls the container runtime on an interval, maintains the TTL cache and
//! serves the dashboard API.

use anyhow::Result;
use fleet_lib::{
    ContainerRuntime, ContainerStore, DockerRuntime, FleetMetrics, FleetService, SyncConfig,
    SyncHealth, SyncLoop,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    info!("Starting fleetwatchd");

    let config = config::ServerConfig::load()?;
    info!(
        socket = %config.docker_socket,
        port = config.listen_port,
        "Server configured"
    );

    let runtime: Arc<dyn ContainerRuntime> =
        Arc::new(DockerRuntime::with_socket(&config.docker_socket));
    let store = Arc::new(ContainerStore::new(Duration::from_secs(
        config.cache_ttl_secs,
    )));
    let service = Arc::new(FleetService::with_stats_concurrency(
        Arc::clone(&runtime),
        Arc::clone(&store),
        config.stats_concurrency,
    ));

    let health = SyncHealth::new();
    let _metrics = FleetMetrics::new();

    // Periodic reconciliation against the runtime.
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let sync_loop = SyncLoop::new(
        Arc::clone(&service),
        SyncConfig {
            interval: Duration::from_secs(config.sync_interval_secs),
        },
        health.clone(),
    );
    let sync_handle = tokio::spawn(sync_loop.run(shutdown_tx.subscribe()));

    let app_state = Arc::new(api::AppState::new(service, health));
    let api_handle = tokio::spawn(api::serve(config.listen_port, app_state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    let _ = shutdown_tx.send(());
    let _ = sync_handle.await;
    api_handle.abort();

    Ok(())
}
