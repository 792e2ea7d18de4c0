//! Event types for the Tandem room engine
//!
//! Two families live here:
//! - [`protocol`]: per-participant commands and notifications (the game protocol)
//! - [`RoomEvent`] + [`EventBus`]: server-wide lifecycle events for monitoring

mod protocol;

pub use protocol::{Command, Notification, Outbound, Target};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Server-wide room lifecycle events
///
/// Broadcast via [`EventBus`] and streamed to monitoring clients over SSE.
/// Carry counts only, never item names or participant tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// Room opened
    RoomCreated {
        code: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Last participant left; room destroyed
    RoomClosed {
        code: String,
        /// Round the room was on when it closed
        round_number: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A rating round began (first round or runoff)
    RoundStarted {
        code: String,
        round_number: u32,
        item_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Game finished with final results
    RoundEnded {
        code: String,
        round_number: u32,
        match_count: usize,
        neutral_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl RoomEvent {
    /// Get event type as string for SSE event names
    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::RoomCreated { .. } => "RoomCreated",
            RoomEvent::RoomClosed { .. } => "RoomClosed",
            RoomEvent::RoundStarted { .. } => "RoundStarted",
            RoomEvent::RoundEnded { .. } => "RoundEnded",
        }
    }

    /// Room the event refers to
    pub fn code(&self) -> &str {
        match self {
            RoomEvent::RoomCreated { code, .. }
            | RoomEvent::RoomClosed { code, .. }
            | RoomEvent::RoundStarted { code, .. }
            | RoomEvent::RoundEnded { code, .. } => code,
        }
    }
}

/// Central distribution bus for room lifecycle events
///
/// Wraps `tokio::sync::broadcast`: publishing never blocks, slow subscribers
/// lag and drop old events, and subscribers clean up when dropped.
///
/// # Examples
///
/// ```
/// use tandem_common::events::{EventBus, RoomEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(RoomEvent::RoomCreated {
///     code: "AB12CD".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().code(), "AB12CD");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RoomEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: RoomEvent) -> Result<usize, broadcast::error::SendError<RoomEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RoomEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
