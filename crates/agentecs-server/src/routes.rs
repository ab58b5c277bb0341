//! REST API route handlers.
//!
//! Provides the main router: a health check, a metadata summary, and the
//! `/ws` upgrade endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::session;
use crate::state::SharedAppState;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` once the handler can run at all.
    pub status: String,
    /// Whether the tick-loop source is currently connected.
    pub connected: bool,
    /// Current tick.
    pub tick: u64,
}

/// Metadata response describing the running server and its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResponse {
    /// Server name.
    pub name: String,
    /// Server version (from `CARGO_PKG_VERSION`).
    pub version: String,
    /// Identifies which kind of world source is driving this server.
    pub source_type: String,
    /// Current tick.
    pub tick: u64,
}

/// Create the main application router.
pub fn create_router(state: SharedAppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/metadata", get(metadata_handler))
        .route("/ws", get(session::ws_upgrade))
        .with_state(state)
}

/// `GET /api/health`
async fn health_handler(State(state): State<SharedAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        connected: state.source().is_connected(),
        tick: state.source().get_current_tick(),
    })
}

/// `GET /api/metadata`
async fn metadata_handler(State(state): State<SharedAppState>) -> Json<MetadataResponse> {
    Json(MetadataResponse {
        name: "agentecs-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        source_type: "tick_loop".to_string(),
        tick: state.source().get_current_tick(),
    })
}
