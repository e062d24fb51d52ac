//! HTTP API for the dashboard
//!
//! JSON endpoints over the fleet service plus health and Prometheus
//! metrics. The listing is served straight from the cache; start/stop
//! return as soon as the optimistic transition is written and the command
//! is accepted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fleet_lib::{FleetService, HealthStatus, SyncHealth};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FleetService>,
    pub health: SyncHealth,
}

impl AppState {
    pub fn new(service: Arc<FleetService>, health: SyncHealth) -> Self {
        Self { service, health }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// GET /api/containers - display-sorted listing
async fn list_containers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.list())
}

/// GET /api/containers/:id - 404 when unknown or stale
async fn get_container(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.service.get(&id) {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "container not found".to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /api/containers/:id/start
async fn start_container(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    command_response(state.service.start(&id).await)
}

/// POST /api/containers/:id/stop
async fn stop_container(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    command_response(state.service.stop(&id).await)
}

fn command_response(result: Result<(), fleet_lib::RuntimeError>) -> axum::response::Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                error: error.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Health check - 200 while the cache is serving, 503 once the runtime
/// looks unreachable
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.health.report().await;

    let status_code = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(report))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/containers", get(list_containers))
        .route("/api/containers/:id", get(get_container))
        .route("/api/containers/:id/start", post(start_container))
        .route("/api/containers/:id/stop", post(stop_container))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
