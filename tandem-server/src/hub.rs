//! Connection hub
//!
//! Maps participant tokens to their connection's outbound queue and routes
//! [`Outbound`] batches from the lobby. Delivery never blocks: a full or
//! closed queue drops the notification with a warning.

use std::collections::HashMap;

use tandem_common::events::{Notification, Outbound};
use tandem_common::ParticipantId;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Registry of live connections
#[derive(Default)]
pub struct ConnectionHub {
    senders: RwLock<HashMap<ParticipantId, mpsc::Sender<Notification>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving end of its queue
    pub async fn register(
        &self,
        participant: ParticipantId,
        buffer: usize,
    ) -> mpsc::Receiver<Notification> {
        let (tx, rx) = mpsc::channel(buffer);
        self.senders.write().await.insert(participant, tx);
        rx
    }

    pub async fn unregister(&self, participant: &ParticipantId) {
        self.senders.write().await.remove(participant);
    }

    pub async fn is_connected(&self, participant: &ParticipantId) -> bool {
        self.senders.read().await.contains_key(participant)
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }

    /// Deliver every outbound to its recipients; returns messages queued
    pub async fn deliver(&self, batch: &[Outbound]) -> usize {
        let senders = self.senders.read().await;
        let mut queued = 0;

        for outbound in batch {
            for participant in outbound.target.recipients() {
                let Some(tx) = senders.get(participant) else {
                    debug!(%participant, kind = outbound.notification.name(), "Recipient not connected");
                    continue;
                };
                match tx.try_send(outbound.notification.clone()) {
                    Ok(()) => queued += 1,
                    Err(e) => warn!(
                        %participant,
                        kind = outbound.notification.name(),
                        "Dropped notification: {}",
                        e
                    ),
                }
            }
        }
        queued
    }
}
