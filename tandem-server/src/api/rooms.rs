//! Room introspection endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::json;
use tandem_common::ids;
use tandem_common::registry::RegistryStats;
use tandem_common::session::SessionSnapshot;

use crate::AppState;

/// Registry counts plus live connections
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub registry: RegistryStats,
    pub connections: usize,
}

/// GET /api/rooms/stats
pub async fn room_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        registry: state.lobby.stats().await,
        connections: state.hub.connection_count().await,
    })
}

/// GET /api/rooms/:code
///
/// Phase, round, and deck progress. No item names or choices.
pub async fn room_snapshot(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    let code = ids::normalize_code(&code);
    state.lobby.snapshot(&code).await.map(Json).map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": e.to_string() })),
        )
    })
}
