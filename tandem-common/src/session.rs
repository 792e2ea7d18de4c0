//! Session state machine
//!
//! One [`Session`] is one two-participant room. Every operation is a
//! synchronous, terminating transition that returns the notifications it
//! produced; callers serialize access per session (see [`crate::registry`]).
//!
//! Phase flow:
//!
//! ```text
//! Idle -> AwaitingSecond -> Submitting -> Rating -> (runoff) Rating ... -> Ended
//! ```

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{classify_all, Verdict};
use crate::error::{Error, Result};
use crate::events::{Notification, Outbound};
use crate::model::{Choice, Item, ParticipantId, Phase};
use crate::shuffle;

/// Maximum participants per session
pub const MAX_PARTICIPANTS: usize = 2;

/// Card a participant is currently looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    pub round_number: u32,
    pub item: Item,
}

/// Deck progress of one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckProgress {
    pub participant: ParticipantId,
    pub cursor: usize,
    pub total: usize,
}

/// Point-in-time view of a session for logging and monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub code: String,
    pub phase: Phase,
    pub round_number: u32,
    pub participant_count: usize,
    pub submitted_count: usize,
    pub item_count: usize,
    pub progress: Vec<DeckProgress>,
}

/// One matching game between (at most) two participants
pub struct Session {
    code: String,
    phase: Phase,
    /// Join order
    participants: Vec<ParticipantId>,
    /// Raw submissions for the current cycle, in arrival order
    submissions: Vec<(ParticipantId, Vec<Item>)>,
    /// Working list of the current round; empty until rating starts
    items: Vec<Item>,
    personal_order: HashMap<ParticipantId, Vec<Item>>,
    cursor: HashMap<ParticipantId, usize>,
    /// item id -> participant -> choice
    ledger: HashMap<String, HashMap<ParticipantId, Choice>>,
    round_number: u32,
    matches: Vec<Item>,
    neutrals: Vec<Item>,
    rng: StdRng,
}

impl Session {
    /// Create an empty session seeded from OS entropy
    pub fn new(code: impl Into<String>) -> Self {
        Self::with_rng(code, StdRng::from_entropy())
    }

    /// Create an empty session with a caller-supplied deck shuffler
    pub fn with_rng(code: impl Into<String>, rng: StdRng) -> Self {
        Self {
            code: code.into(),
            phase: Phase::Idle,
            participants: Vec::with_capacity(MAX_PARTICIPANTS),
            submissions: Vec::with_capacity(MAX_PARTICIPANTS),
            items: Vec::new(),
            personal_order: HashMap::new(),
            cursor: HashMap::new(),
            ledger: HashMap::new(),
            round_number: 1,
            matches: Vec::new(),
            neutrals: Vec::new(),
            rng,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    /// Working item list of the current round
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// True if `participant` has submitted for the current cycle
    pub fn has_submitted(&self, participant: &ParticipantId) -> bool {
        self.submissions.iter().any(|(p, _)| p == participant)
    }

    /// Raw items submitted so far this cycle, in arrival order
    pub fn submitted_items(&self) -> impl Iterator<Item = &Item> {
        self.submissions.iter().flat_map(|(_, items)| items.iter())
    }

    /// A participant's shuffled deck for the current round
    pub fn personal_order(&self, participant: &ParticipantId) -> Option<&[Item]> {
        self.personal_order.get(participant).map(Vec::as_slice)
    }

    pub fn cursor(&self, participant: &ParticipantId) -> Option<usize> {
        self.cursor.get(participant).copied()
    }

    /// Recorded choice for an (item, participant) pair
    pub fn choice(&self, item_id: &str, participant: &ParticipantId) -> Option<Choice> {
        self.ledger.get(item_id)?.get(participant).copied()
    }

    pub fn matches(&self) -> &[Item] {
        &self.matches
    }

    pub fn neutrals(&self) -> &[Item] {
        &self.neutrals
    }

    /// Add a participant, returning the new count
    pub fn add_participant(&mut self, participant: ParticipantId) -> Result<usize> {
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(Error::RoomFull(self.code.clone()));
        }
        if !self.contains(&participant) {
            self.participants.push(participant);
        }
        if self.phase.is_lobby() {
            self.phase = Phase::for_participant_count(self.participants.len());
        }
        Ok(self.participants.len())
    }

    /// Remove a participant; returns false if it was not a member
    ///
    /// In the lobby phases only the departed participant's submission is
    /// withdrawn; the partner's stays and counts toward the next pairing.
    /// Once rating has begun the phase and decks stay as they are: the
    /// departed participant's unfinished deck keeps the round from completing.
    pub fn remove_participant(&mut self, participant: &ParticipantId) -> bool {
        let Some(pos) = self.participants.iter().position(|p| p == participant) else {
            return false;
        };
        self.participants.remove(pos);

        if self.phase.is_lobby() {
            self.submissions.retain(|(p, _)| p != participant);
            self.phase = Phase::for_participant_count(self.participants.len());
        }
        true
    }

    /// Record one participant's submission
    ///
    /// A repeated submission from the same participant is ignored. Once both
    /// participants have submitted, the combined list is deduplicated and the
    /// first round starts.
    pub fn submit_items(
        &mut self,
        participant: &ParticipantId,
        names: Vec<String>,
    ) -> Result<Vec<Outbound>> {
        if self.phase != Phase::Submitting {
            return Err(Error::InvalidPhase(format!(
                "cannot submit items while {}",
                self.phase
            )));
        }
        if !self.contains(participant) {
            return Err(Error::NotInRoom);
        }
        if self.has_submitted(participant) {
            debug!(code = %self.code, %participant, "Duplicate submission ignored");
            return Ok(Vec::new());
        }

        self.submissions
            .push((participant.clone(), names.into_iter().map(Item::new).collect()));
        debug!(
            code = %self.code,
            %participant,
            submitted = self.submissions.len(),
            raw_items = self.submitted_items().count(),
            "Items submitted"
        );

        if self.submissions.len() < MAX_PARTICIPANTS {
            return Ok(Vec::new());
        }

        let raw: Vec<Item> = self.submitted_items().cloned().collect();
        let working = dedup_keep_last(raw);
        info!(code = %self.code, items = working.len(), "Both lists in, starting rating");
        self.phase = Phase::Rating;
        Ok(self.start_round(working))
    }

    /// Record a participant's choice and advance its cursor
    ///
    /// A second choice for the same (item, participant) pair is dropped. The
    /// cursor advances by one regardless of which item id was referenced:
    /// clients must vote strictly in the order they were shown.
    pub fn record_choice(
        &mut self,
        participant: &ParticipantId,
        item_id: &str,
        choice: Choice,
    ) -> Result<Vec<Outbound>> {
        if self.phase != Phase::Rating {
            return Err(Error::InvalidPhase(format!(
                "cannot make a choice while {}",
                self.phase
            )));
        }
        if !self.contains(participant) {
            return Err(Error::NotInRoom);
        }
        let total = match self.personal_order.get(participant) {
            Some(deck) => deck.len(),
            None => {
                return Err(Error::InvalidPhase(
                    "no deck dealt for this round".to_string(),
                ))
            }
        };
        let cursor = self.cursor.get(participant).copied().unwrap_or(0);

        if self.choice(item_id, participant).is_some() {
            debug!(code = %self.code, %participant, item_id, "Duplicate choice ignored");
            return Ok(Vec::new());
        }
        if cursor >= total {
            debug!(code = %self.code, %participant, item_id, "Choice after deck end ignored");
            return Ok(Vec::new());
        }

        self.ledger
            .entry(item_id.to_string())
            .or_default()
            .insert(participant.clone(), choice);
        let cursor = cursor + 1;
        self.cursor.insert(participant.clone(), cursor);
        debug!(code = %self.code, %participant, item_id, ?choice, cursor, total, "Choice recorded");

        if cursor < total {
            let item = self.personal_order[participant][cursor].clone();
            return Ok(vec![Outbound::to(
                participant,
                Notification::ShowItem {
                    item,
                    index: cursor,
                    total,
                },
            )]);
        }

        let mut out = vec![Outbound::to(participant, Notification::WaitingForOther)];
        if self.round_complete() {
            out.extend(self.complete_round());
        }
        Ok(out)
    }

    /// Card the participant is currently looking at, if any
    pub fn pending_item(&self, participant: &ParticipantId) -> Option<PendingItem> {
        if self.phase != Phase::Rating {
            return None;
        }
        let deck = self.personal_order.get(participant)?;
        let cursor = self.cursor.get(participant).copied().unwrap_or(0);
        deck.get(cursor).map(|item| PendingItem {
            round_number: self.round_number,
            item: item.clone(),
        })
    }

    /// True when every dealt deck has been walked to the end
    pub fn round_complete(&self) -> bool {
        self.personal_order.iter().all(|(p, deck)| {
            self.cursor.get(p).copied().unwrap_or(0) == deck.len()
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut progress: Vec<DeckProgress> = self
            .personal_order
            .iter()
            .map(|(p, deck)| DeckProgress {
                participant: p.clone(),
                cursor: self.cursor.get(p).copied().unwrap_or(0),
                total: deck.len(),
            })
            .collect();
        progress.sort_by(|a, b| a.participant.cmp(&b.participant));

        SessionSnapshot {
            code: self.code.clone(),
            phase: self.phase,
            round_number: self.round_number,
            participant_count: self.participants.len(),
            submitted_count: self.submissions.len(),
            item_count: if self.phase.is_lobby() {
                self.submitted_items().count()
            } else {
                self.items.len()
            },
            progress,
        }
    }

    /// Deal fresh decks for `items` and announce the round
    fn start_round(&mut self, items: Vec<Item>) -> Vec<Outbound> {
        self.personal_order.clear();
        self.cursor.clear();
        self.ledger.clear();
        self.matches.clear();
        self.neutrals.clear();

        for p in &self.participants {
            let deck = shuffle::shuffled(&items, &mut self.rng);
            self.personal_order.insert(p.clone(), deck);
            self.cursor.insert(p.clone(), 0);
        }
        self.items = items;

        info!(
            code = %self.code,
            round = self.round_number,
            items = self.items.len(),
            "Round started"
        );

        let mut out = vec![Outbound::broadcast(
            &self.participants,
            Notification::RoundStarted {
                round_number: self.round_number,
                items: self.items.clone(),
            },
        )];
        for p in &self.participants {
            let deck = &self.personal_order[p];
            if let Some(first) = deck.first() {
                out.push(Outbound::to(
                    p,
                    Notification::ShowItem {
                        item: first.clone(),
                        index: 0,
                        total: deck.len(),
                    },
                ));
            }
        }
        out
    }

    /// Classify the round; run off on 2+ matches, otherwise end the game
    fn complete_round(&mut self) -> Vec<Outbound> {
        let mut matches = Vec::new();
        let mut neutrals = Vec::new();

        for item in &self.items {
            let choices: Vec<Choice> = self
                .ledger
                .get(&item.id)
                .map(|votes| votes.values().copied().collect())
                .unwrap_or_default();
            match classify_all(&choices) {
                Some(Verdict::Match) => matches.push(item.clone()),
                Some(Verdict::Neutral) => neutrals.push(item.clone()),
                Some(Verdict::Rejected) => {}
                None => debug!(code = %self.code, item_id = %item.id, votes = choices.len(), "Item skipped"),
            }
        }

        info!(
            code = %self.code,
            round = self.round_number,
            matches = matches.len(),
            neutrals = neutrals.len(),
            "Round complete"
        );

        if matches.len() >= 2 {
            self.round_number += 1;
            return self.start_round(matches);
        }

        self.phase = Phase::Ended;
        self.matches = matches;
        self.neutrals = neutrals;
        vec![Outbound::broadcast(
            &self.participants,
            Notification::RoundEnded {
                matches: self.matches.clone(),
                neutrals: self.neutrals.clone(),
            },
        )]
    }
}

/// Deduplicate by lowercased name, keeping the last occurrence
///
/// Each name keeps the slot of its first occurrence; a later duplicate
/// replaces the item stored there.
pub fn dedup_keep_last(items: Vec<Item>) -> Vec<Item> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Item> = Vec::with_capacity(items.len());

    for item in items {
        match slots.get(&item.dedup_key()) {
            Some(&idx) => out[idx] = item,
            None => {
                slots.insert(item.dedup_key(), out.len());
                out.push(item);
            }
        }
    }
    out
}
