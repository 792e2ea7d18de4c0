//! WebSocket game protocol
//!
//! One connection is one participant. The server issues the participant
//! token in a `welcome` frame, then exchanges JSON `Command`s and
//! `Notification`s. Closing the socket disconnects the participant.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tandem_common::events::{Command, Notification, Outbound};
use tandem_common::ParticipantId;
use tracing::{debug, info, warn};

use crate::AppState;

/// GET /ws - upgrade to the game protocol
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_connection(socket, state))
}

/// Parse one inbound text frame
pub fn parse_command(text: &str) -> Result<Command, String> {
    serde_json::from_str(text).map_err(|e| format!("Malformed command: {}", e))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let participant = ParticipantId::generate();
    info!(%participant, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();
    let mut outbox = state
        .hub
        .register(participant.clone(), state.config.outbound_buffer)
        .await;

    let welcome = json!({ "type": "welcome", "participantId": participant.as_str() });
    if sink.send(Message::Text(welcome.to_string())).await.is_err() {
        state.hub.unregister(&participant).await;
        return;
    }

    // Writer: drain the outbound queue into the socket
    let writer_id = participant.clone();
    let mut writer = tokio::spawn(async move {
        while let Some(notification) = outbox.recv().await {
            let text = match serde_json::to_string(&notification) {
                Ok(text) => text,
                Err(e) => {
                    warn!(participant = %writer_id, "Failed to serialize notification: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Reader: parse frames and dispatch until the socket closes
    let reader_state = state.clone();
    let reader_id = participant.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match parse_command(&text) {
                    Ok(Command::Disconnect) => break,
                    Ok(command) => crate::dispatch(&reader_state, &reader_id, command).await,
                    Err(message) => {
                        debug!(participant = %reader_id, "{}", message);
                        reader_state
                            .hub
                            .deliver(&[Outbound::to(&reader_id, Notification::error(message))])
                            .await;
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(participant = %reader_id, "WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    state.hub.unregister(&participant).await;
    crate::dispatch(&state, &participant, Command::Disconnect).await;
    info!(%participant, "WebSocket closed");
}
