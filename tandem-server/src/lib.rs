//! tandem-server library - WebSocket transport for the Tandem room engine
//!
//! Maps JSON frames to [`Command`]s, runs them through the [`Lobby`], and
//! routes the resulting notifications to connected participants.

use std::sync::Arc;

use axum::Router;
use tandem_common::config::ServerConfig;
use tandem_common::events::{Command, Notification};
use tandem_common::{Lobby, ParticipantId};
use tracing::debug;

pub mod api;
pub mod hub;
pub mod submission;
pub mod timer;

use hub::ConnectionHub;

/// Application state shared across HTTP handlers and connection tasks
#[derive(Clone)]
pub struct AppState {
    /// Room engine
    pub lobby: Arc<Lobby>,
    /// Live connections
    pub hub: Arc<ConnectionHub>,
    /// Resolved configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServerConfig) -> Self {
        Self::with_lobby(Lobby::from_config(&config), config)
    }

    /// Create application state around an existing lobby (tests)
    pub fn with_lobby(lobby: Lobby, config: ServerConfig) -> Self {
        Self {
            lobby: Arc::new(lobby),
            hub: Arc::new(ConnectionHub::new()),
            config: Arc::new(config),
        }
    }
}

/// Run one command for `participant` and deliver the results
///
/// Submissions are validated here before reaching the room engine. Every
/// `showItem` delivered arms the auto-neutral timer when it is enabled.
pub async fn dispatch(state: &AppState, participant: &ParticipantId, command: Command) {
    let command = match command {
        Command::SubmitItems { names } => {
            match submission::clean_names(names, state.config.min_items) {
                Ok(names) => Command::SubmitItems { names },
                Err(e) => {
                    let rejection = tandem_common::events::Outbound::to(
                        participant,
                        Notification::error(e.to_string()),
                    );
                    state.hub.deliver(&[rejection]).await;
                    return;
                }
            }
        }
        other => other,
    };

    let batch = state.lobby.handle(participant, command).await;
    let queued = state.hub.deliver(&batch).await;
    debug!(%participant, notifications = batch.len(), queued, "Dispatched");

    if state.config.choice_timeout_secs > 0 {
        timer::arm_for_batch(state, &batch).await;
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/ws", get(api::ws_handler))
        .route("/api/events", get(api::event_stream))
        .route("/api/rooms/stats", get(api::room_stats))
        .route("/api/rooms/:code", get(api::room_snapshot))
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
