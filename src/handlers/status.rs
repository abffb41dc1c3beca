//! Status and health check handlers
//!
//! - `/health` - Simple liveness check for systemd/load balancers
//! - `/status` - Uptime, store record counts, and metric counters
//! - `/metrics` - Prometheus text exposition

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::Result;
use crate::metrics::MetricsSnapshot;

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name from Cargo.toml
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Health check response for simple liveness probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (always "healthy" if responding)
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Store record counts reported by `/status`
#[derive(Debug, Clone, Serialize)]
pub struct StoreCounts {
    /// Reading requests persisted
    pub reading_requests: usize,
    /// Orders persisted
    pub orders: usize,
    /// Orders in the paid state
    pub paid_orders: usize,
    /// Audit log length
    pub events: usize,
    /// Processed webhook event ids
    pub processed_webhook_events: usize,
}

/// Detailed server status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Server version (from Cargo.toml)
    pub version: String,
    /// Server name
    pub name: String,
    /// Server status (always "running" if responding)
    pub status: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Persisted record counts
    pub store: StoreCounts,
    /// Transition counters
    pub counters: MetricsSnapshot,
    /// ISO8601 timestamp of when status was generated
    pub timestamp: String,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `GET /status`
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    let snapshot = state.store.snapshot().await?;

    Ok(Json(StatusResponse {
        version: SERVER_VERSION.to_string(),
        name: SERVER_NAME.to_string(),
        status: "running".to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        store: StoreCounts {
            reading_requests: snapshot.reading_requests.len(),
            orders: snapshot.orders.len(),
            paid_orders: snapshot
                .orders
                .iter()
                .filter(|o| o.status.is_paid())
                .count(),
            events: snapshot.events.len(),
            processed_webhook_events: snapshot.processed_webhook_events.len(),
        },
        counters: state.metrics.snapshot(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.to_prometheus_format()
}
