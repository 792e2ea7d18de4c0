//! Inbound commands and outbound notifications
//!
//! These are the only types the transport adapter exchanges with the core.
//! Both serialize as JSON objects tagged by `"type"`.

use serde::{Deserialize, Serialize};

use crate::model::{Choice, Item, ParticipantId};

/// Action sent by a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Open a new room; the sender becomes its first participant
    CreateRoom,

    /// Join an existing room by code
    JoinRoom { code: String },

    /// Submit candidate names for the current cycle
    SubmitItems { names: Vec<String> },

    /// Rate one item
    #[serde(rename_all = "camelCase")]
    MakeChoice { item_id: String, choice: Choice },

    /// Connection closed; synthesized by the adapter
    Disconnect,
}

impl Command {
    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateRoom => "createRoom",
            Command::JoinRoom { .. } => "joinRoom",
            Command::SubmitItems { .. } => "submitItems",
            Command::MakeChoice { .. } => "makeChoice",
            Command::Disconnect => "disconnect",
        }
    }
}

/// Message delivered to one participant or to a whole session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// Room opened (creator only)
    RoomCreated { code: String },

    /// Membership changed (broadcast)
    ParticipantCountChanged { count: usize },

    /// New round with the shared, unshuffled item list (broadcast)
    #[serde(rename_all = "camelCase")]
    RoundStarted { round_number: u32, items: Vec<Item> },

    /// Next card of the recipient's own deck
    ShowItem { item: Item, index: usize, total: usize },

    /// Recipient finished its deck; partner still rating
    WaitingForOther,

    /// Final results (broadcast, only when the game ends)
    RoundEnded { matches: Vec<Item>, neutrals: Vec<Item> },

    /// Rejected action (originator only)
    Error { message: String },
}

impl Notification {
    /// Notification name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Notification::RoomCreated { .. } => "roomCreated",
            Notification::ParticipantCountChanged { .. } => "participantCountChanged",
            Notification::RoundStarted { .. } => "roundStarted",
            Notification::ShowItem { .. } => "showItem",
            Notification::WaitingForOther => "waitingForOther",
            Notification::RoundEnded { .. } => "roundEnded",
            Notification::Error { .. } => "error",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification::Error {
            message: message.into(),
        }
    }
}

/// Who receives an outbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single participant
    Participant(ParticipantId),
    /// Every member of the session at emission time
    Session(Vec<ParticipantId>),
}

impl Target {
    /// Expand to the concrete recipient list
    pub fn recipients(&self) -> &[ParticipantId] {
        match self {
            Target::Participant(p) => std::slice::from_ref(p),
            Target::Session(ps) => ps,
        }
    }
}

/// A notification paired with its audience
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub target: Target,
    pub notification: Notification,
}

impl Outbound {
    pub fn to(participant: &ParticipantId, notification: Notification) -> Self {
        Self {
            target: Target::Participant(participant.clone()),
            notification,
        }
    }

    pub fn broadcast(participants: &[ParticipantId], notification: Notification) -> Self {
        Self {
            target: Target::Session(participants.to_vec()),
            notification,
        }
    }

    /// True if `participant` is among the recipients
    pub fn reaches(&self, participant: &ParticipantId) -> bool {
        self.target.recipients().contains(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let cmd: Command = serde_json::from_value(json!({
            "type": "makeChoice",
            "itemId": "tacos-1a2b3c4d",
            "choice": "no"
        }))
        .unwrap();
        assert_eq!(
            cmd,
            Command::MakeChoice {
                item_id: "tacos-1a2b3c4d".to_string(),
                choice: Choice::No
            }
        );

        let cmd: Command = serde_json::from_value(json!({"type": "createRoom"})).unwrap();
        assert_eq!(cmd, Command::CreateRoom);

        let cmd: Command =
            serde_json::from_value(json!({"type": "joinRoom", "code": "ABC123"})).unwrap();
        assert_eq!(cmd.name(), "joinRoom");
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(serde_json::from_value::<Command>(json!({"type": "launchRockets"})).is_err());
    }

    #[test]
    fn test_notification_wire_format() {
        let n = Notification::RoundStarted {
            round_number: 2,
            items: vec![],
        };
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({"type": "roundStarted", "roundNumber": 2, "items": []})
        );
        assert_eq!(
            serde_json::to_value(Notification::WaitingForOther).unwrap(),
            json!({"type": "waitingForOther"})
        );
    }

    #[test]
    fn test_target_recipients() {
        let a = ParticipantId::from("a");
        let b = ParticipantId::from("b");
        let out = Outbound::broadcast(&[a.clone(), b.clone()], Notification::WaitingForOther);
        assert!(out.reaches(&a) && out.reaches(&b));

        let out = Outbound::to(&a, Notification::WaitingForOther);
        assert_eq!(out.target.recipients(), &[a.clone()]);
        assert!(!out.reaches(&b));
    }
}
