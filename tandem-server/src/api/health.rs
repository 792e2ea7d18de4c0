//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Liveness plus a glance at load
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub build: &'static str,
    pub rooms: usize,
    pub connections: usize,
    /// Auto-neutral deadline in seconds, 0 when disabled
    pub choice_timeout_secs: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "tandem-server",
        version: env!("CARGO_PKG_VERSION"),
        build: env!("GIT_HASH"),
        rooms: state.lobby.stats().await.rooms,
        connections: state.hub.connection_count().await,
        choice_timeout_secs: state.config.choice_timeout_secs,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
