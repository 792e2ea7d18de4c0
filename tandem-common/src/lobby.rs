//! Command dispatch
//!
//! [`Lobby::handle`] is the single entry point for the transport adapter:
//! it takes a participant's command and returns the notifications to deliver.
//! Rejections become an `error` notification for the sender; nothing here
//! ends a session or a connection.

use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::events::{Command, EventBus, Notification, Outbound, RoomEvent};
use crate::ids;
use crate::model::{Choice, ParticipantId};
use crate::registry::{Registry, RegistryStats};
use crate::session::{PendingItem, SessionSnapshot};

/// Room engine facade: registry plus lifecycle event publishing
pub struct Lobby {
    registry: Registry,
    events: EventBus,
}

impl Lobby {
    pub fn new(registry: Registry, events: EventBus) -> Self {
        Self { registry, events }
    }

    /// Build a lobby sized by the server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            Registry::new(config.code_length),
            EventBus::new(config.event_capacity),
        )
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Apply one command from `participant`
    pub async fn handle(&self, participant: &ParticipantId, command: Command) -> Vec<Outbound> {
        let name = command.name();
        debug!(%participant, command = name, "Handling command");

        match self.dispatch(participant, command).await {
            Ok(out) => out,
            Err(e) => {
                warn!(%participant, command = name, "Rejected: {}", e);
                vec![Outbound::to(participant, Notification::error(e.to_string()))]
            }
        }
    }

    async fn dispatch(&self, participant: &ParticipantId, command: Command) -> Result<Vec<Outbound>> {
        match command {
            Command::CreateRoom => self.create_room(participant).await,
            Command::JoinRoom { code } => self.join_room(participant, &code).await,
            Command::SubmitItems { names } => self.submit_items(participant, names).await,
            Command::MakeChoice { item_id, choice } => {
                self.make_choice(participant, &item_id, choice).await
            }
            Command::Disconnect => Ok(self.disconnect(participant).await),
        }
    }

    async fn create_room(&self, participant: &ParticipantId) -> Result<Vec<Outbound>> {
        if let Some(code) = self.registry.room_of(participant).await {
            return Err(Error::AlreadyInRoom(code));
        }

        let code = self.registry.create_session().await?;
        self.events.emit_lossy(RoomEvent::RoomCreated {
            code: code.clone(),
            timestamp: chrono::Utc::now(),
        });

        let joined = match self.registry.join(&code, participant).await {
            Ok(joined) => joined,
            Err(e) => {
                self.registry.discard_if_empty(&code).await;
                return Err(e);
            }
        };
        let members = joined.session.lock().await.participants().to_vec();

        Ok(vec![
            Outbound::to(participant, Notification::RoomCreated { code }),
            Outbound::broadcast(
                &members,
                Notification::ParticipantCountChanged {
                    count: joined.count,
                },
            ),
        ])
    }

    async fn join_room(&self, participant: &ParticipantId, code: &str) -> Result<Vec<Outbound>> {
        let code = ids::normalize_code(code);
        let joined = self.registry.join(&code, participant).await?;
        let members = joined.session.lock().await.participants().to_vec();

        Ok(vec![Outbound::broadcast(
            &members,
            Notification::ParticipantCountChanged {
                count: joined.count,
            },
        )])
    }

    async fn submit_items(
        &self,
        participant: &ParticipantId,
        names: Vec<String>,
    ) -> Result<Vec<Outbound>> {
        let (code, shared) = self.registry.session_of(participant).await?;
        let (out, round_number) = {
            let mut session = shared.lock().await;
            let out = session.submit_items(participant, names)?;
            (out, session.round_number())
        };
        self.publish_round_events(&code, round_number, &out);
        Ok(out)
    }

    async fn make_choice(
        &self,
        participant: &ParticipantId,
        item_id: &str,
        choice: Choice,
    ) -> Result<Vec<Outbound>> {
        let (code, shared) = self.registry.session_of(participant).await?;
        let (out, round_number) = {
            let mut session = shared.lock().await;
            let out = session.record_choice(participant, item_id, choice)?;
            (out, session.round_number())
        };
        self.publish_round_events(&code, round_number, &out);
        if out.iter().any(|o| matches!(o.notification, Notification::RoundEnded { .. })) {
            info!(%code, round = round_number, "Game ended");
        }
        Ok(out)
    }

    /// Drop the participant from its room; a no-op when it has none
    async fn disconnect(&self, participant: &ParticipantId) -> Vec<Outbound> {
        let Some(code) = self.registry.room_of(participant).await else {
            debug!(%participant, "Disconnect without a room");
            return Vec::new();
        };
        let Some(departure) = self.registry.remove_participant(&code, participant).await else {
            return Vec::new();
        };

        if departure.destroyed {
            self.events.emit_lossy(RoomEvent::RoomClosed {
                code,
                round_number: departure.round_number,
                timestamp: chrono::Utc::now(),
            });
            return Vec::new();
        }

        vec![Outbound::broadcast(
            &departure.remaining,
            Notification::ParticipantCountChanged {
                count: departure.remaining.len(),
            },
        )]
    }

    /// Card `participant` currently has in front of it, if any
    pub async fn pending_item(&self, participant: &ParticipantId) -> Option<PendingItem> {
        let (_, shared) = self.registry.session_of(participant).await.ok()?;
        let session = shared.lock().await;
        session.pending_item(participant)
    }

    pub async fn snapshot(&self, code: &str) -> Result<SessionSnapshot> {
        let shared = self.registry.lookup(code).await?;
        let snapshot = shared.lock().await.snapshot();
        Ok(snapshot)
    }

    pub async fn stats(&self) -> RegistryStats {
        self.registry.stats().await
    }

    fn publish_round_events(&self, code: &str, round_number: u32, out: &[Outbound]) {
        for outbound in out {
            match &outbound.notification {
                Notification::RoundStarted {
                    round_number,
                    items,
                } => self.events.emit_lossy(RoomEvent::RoundStarted {
                    code: code.to_string(),
                    round_number: *round_number,
                    item_count: items.len(),
                    timestamp: chrono::Utc::now(),
                }),
                Notification::RoundEnded { matches, neutrals } => {
                    self.events.emit_lossy(RoomEvent::RoundEnded {
                        code: code.to_string(),
                        round_number,
                        match_count: matches.len(),
                        neutral_count: neutrals.len(),
                        timestamp: chrono::Utc::now(),
                    })
                }
                _ => {}
            }
        }
    }
}
