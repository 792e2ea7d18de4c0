//! Core data types shared by the room engine and its adapters

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids;

/// Candidate being rated (e.g. a restaurant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Name slug plus random salt
    pub id: String,
    /// Name as submitted (trimmed)
    pub name: String,
}

impl Item {
    /// Create an item with a freshly generated id
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ids::item_id(&name),
            name,
        }
    }

    /// Key used for case-insensitive deduplication
    pub fn dedup_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A participant's rating of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Yes,
    Neutral,
    No,
}

/// Opaque participant identity, issued by the transport adapter per connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Issue a fresh random token
    pub fn generate() -> Self {
        Self(ids::participant_token())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No participants
    Idle,
    /// One participant, waiting for a partner
    AwaitingSecond,
    /// Both present, collecting item lists
    Submitting,
    /// Participants walking their personal decks
    Rating,
    /// Final results delivered
    Ended,
}

impl Phase {
    /// Phase implied by membership while still in the lobby
    pub fn for_participant_count(count: usize) -> Self {
        match count {
            0 => Phase::Idle,
            1 => Phase::AwaitingSecond,
            _ => Phase::Submitting,
        }
    }

    /// True before the first round has started
    pub fn is_lobby(&self) -> bool {
        matches!(self, Phase::Idle | Phase::AwaitingSecond | Phase::Submitting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::AwaitingSecond => "awaiting_second",
            Phase::Submitting => "submitting",
            Phase::Rating => "rating",
            Phase::Ended => "ended",
        };
        f.write_str(s)
    }
}
