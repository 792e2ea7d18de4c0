//! Session registry
//!
//! Owns the map from room code to [`Session`] and the map from participant to
//! the room it is bound to. The maps are the only process-wide shared state;
//! each session sits behind its own mutex so different rooms proceed
//! concurrently.
//!
//! Lock order: `sessions` map, then `memberships` map, then a session.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ids;
use crate::model::ParticipantId;
use crate::session::Session;

/// Attempts at finding an unused code before giving up
const MAX_CODE_ATTEMPTS: usize = 1000;

/// Handle to one session; lock it to run a transition
pub type SharedSession = Arc<Mutex<Session>>;

/// Result of a successful join
#[derive(Clone)]
pub struct Joined {
    pub session: SharedSession,
    pub count: usize,
}

/// Result of removing a participant that was present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub code: String,
    /// Members left behind (empty if the session was destroyed)
    pub remaining: Vec<ParticipantId>,
    pub destroyed: bool,
    pub round_number: u32,
}

/// Room and participant counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RegistryStats {
    pub rooms: usize,
    pub participants: usize,
}

/// Code -> session map plus participant membership
pub struct Registry {
    sessions: RwLock<HashMap<String, SharedSession>>,
    memberships: RwLock<HashMap<ParticipantId, String>>,
    /// Code generation and per-session shuffle seeds
    rng: Mutex<StdRng>,
    code_length: usize,
}

impl Registry {
    /// Create an empty registry seeded from OS entropy
    pub fn new(code_length: usize) -> Self {
        Self::with_rng(code_length, StdRng::from_entropy())
    }

    /// Create an empty registry with a deterministic generator (tests)
    pub fn with_seed(code_length: usize, seed: u64) -> Self {
        Self::with_rng(code_length, StdRng::seed_from_u64(seed))
    }

    fn with_rng(code_length: usize, rng: StdRng) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
            rng: Mutex::new(rng),
            code_length,
        }
    }

    /// Create an empty session under a fresh code
    pub async fn create_session(&self) -> Result<String> {
        let mut sessions = self.sessions.write().await;
        let mut rng = self.rng.lock().await;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = ids::room_code(&mut *rng, self.code_length);
            if sessions.contains_key(&code) {
                debug!(%code, "Room code collision, retrying");
                continue;
            }
            let session = Session::with_rng(code.clone(), StdRng::seed_from_u64(rng.gen()));
            sessions.insert(code.clone(), Arc::new(Mutex::new(session)));
            info!(%code, rooms = sessions.len(), "Room created");
            return Ok(code);
        }

        Err(Error::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    /// Look up a session by code
    pub async fn lookup(&self, code: &str) -> Result<SharedSession> {
        self.sessions
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| Error::RoomNotFound(code.to_string()))
    }

    /// Add `participant` to the session `code`
    pub async fn join(&self, code: &str, participant: &ParticipantId) -> Result<Joined> {
        let sessions = self.sessions.read().await;
        let mut memberships = self.memberships.write().await;

        if let Some(current) = memberships.get(participant) {
            return Err(Error::AlreadyInRoom(current.clone()));
        }
        let shared = sessions
            .get(code)
            .cloned()
            .ok_or_else(|| Error::RoomNotFound(code.to_string()))?;

        let count = shared.lock().await.add_participant(participant.clone())?;
        memberships.insert(participant.clone(), code.to_string());
        info!(%code, %participant, count, "Participant joined");

        Ok(Joined {
            session: shared,
            count,
        })
    }

    /// Remove `participant` from session `code`, destroying it when empty
    ///
    /// Returns `None` if the session or the participant was already gone.
    pub async fn remove_participant(
        &self,
        code: &str,
        participant: &ParticipantId,
    ) -> Option<Departure> {
        let mut sessions = self.sessions.write().await;
        let mut memberships = self.memberships.write().await;

        if memberships.get(participant).map(String::as_str) == Some(code) {
            memberships.remove(participant);
        }

        let shared = sessions.get(code)?.clone();
        let mut session = shared.lock().await;
        if !session.remove_participant(participant) {
            return None;
        }

        let departure = Departure {
            code: code.to_string(),
            remaining: session.participants().to_vec(),
            destroyed: session.is_empty(),
            round_number: session.round_number(),
        };
        drop(session);

        if departure.destroyed {
            sessions.remove(code);
            info!(%code, rooms = sessions.len(), "Room destroyed");
        } else {
            info!(%code, %participant, remaining = departure.remaining.len(), "Participant left");
        }
        Some(departure)
    }

    /// Remove session `code` if nobody is in it
    pub async fn discard_if_empty(&self, code: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let empty = match sessions.get(code) {
            Some(shared) => shared.lock().await.is_empty(),
            None => return false,
        };
        if empty {
            sessions.remove(code);
            debug!(%code, "Discarded empty room");
        }
        empty
    }

    /// Room code the participant is bound to
    pub async fn room_of(&self, participant: &ParticipantId) -> Option<String> {
        self.memberships.read().await.get(participant).cloned()
    }

    /// Resolve a participant's session
    pub async fn session_of(&self, participant: &ParticipantId) -> Result<(String, SharedSession)> {
        let code = self.room_of(participant).await.ok_or(Error::NotInRoom)?;
        let session = self.lookup(&code).await.map_err(|_| Error::NotInRoom)?;
        Ok((code, session))
    }

    pub async fn contains(&self, code: &str) -> bool {
        self.sessions.read().await.contains_key(code)
    }

    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            rooms: self.sessions.read().await.len(),
            participants: self.memberships.read().await.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Phase;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let registry = Registry::with_seed(6, 1);
        let code = registry.create_session().await.unwrap();
        assert_eq!(code.len(), 6);

        let session = registry.lookup(&code).await.unwrap();
        let session = session.lock().await;
        assert_eq!(session.code(), code);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.round_number(), 1);
    }

    #[tokio::test]
    async fn test_codes_are_unique() {
        let registry = Registry::with_seed(2, 5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(registry.create_session().await.unwrap()));
        }
        assert_eq!(registry.stats().await.rooms, 200);
    }

    #[tokio::test]
    async fn test_code_space_exhaustion_is_reported() {
        let registry = Registry::with_seed(0, 5);
        registry.create_session().await.unwrap();
        assert!(matches!(
            registry.create_session().await,
            Err(Error::CodeSpaceExhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_missing_room() {
        let registry = Registry::with_seed(6, 1);
        assert!(matches!(
            registry.lookup("NOPE00").await,
            Err(Error::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_join_until_full() {
        let registry = Registry::with_seed(6, 2);
        let code = registry.create_session().await.unwrap();

        assert_eq!(registry.join(&code, &pid("a")).await.unwrap().count, 1);
        assert_eq!(registry.join(&code, &pid("b")).await.unwrap().count, 2);
        assert!(matches!(
            registry.join(&code, &pid("c")).await,
            Err(Error::RoomFull(_))
        ));
        assert_eq!(registry.room_of(&pid("c")).await, None);
        assert!(matches!(
            registry.join("ZZZZZZ", &pid("d")).await,
            Err(Error::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_join_twice_rejected() {
        let registry = Registry::with_seed(6, 3);
        let first = registry.create_session().await.unwrap();
        let second = registry.create_session().await.unwrap();
        registry.join(&first, &pid("a")).await.unwrap();
        assert!(matches!(
            registry.join(&second, &pid("a")).await,
            Err(Error::AlreadyInRoom(code)) if code == first
        ));
    }

    #[tokio::test]
    async fn test_remove_last_participant_destroys_room() {
        let registry = Registry::with_seed(6, 4);
        let code = registry.create_session().await.unwrap();
        registry.join(&code, &pid("a")).await.unwrap();
        registry.join(&code, &pid("b")).await.unwrap();

        let gone = registry.remove_participant(&code, &pid("a")).await.unwrap();
        assert!(!gone.destroyed);
        assert_eq!(gone.remaining, vec![pid("b")]);
        assert!(registry.contains(&code).await);

        let gone = registry.remove_participant(&code, &pid("b")).await.unwrap();
        assert!(gone.destroyed);
        assert!(!registry.contains(&code).await);
        assert_eq!(registry.stats().await, RegistryStats { rooms: 0, participants: 0 });
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = Registry::with_seed(6, 6);
        let code = registry.create_session().await.unwrap();
        registry.join(&code, &pid("a")).await.unwrap();
        registry.join(&code, &pid("b")).await.unwrap();

        assert!(registry.remove_participant(&code, &pid("a")).await.is_some());
        assert!(registry.remove_participant(&code, &pid("a")).await.is_none());
        assert!(registry.remove_participant("NOPE00", &pid("b")).await.is_none());
        assert!(registry.contains(&code).await);
    }

    #[tokio::test]
    async fn test_session_of() {
        let registry = Registry::with_seed(6, 7);
        let code = registry.create_session().await.unwrap();
        assert!(matches!(
            registry.session_of(&pid("a")).await,
            Err(Error::NotInRoom)
        ));
        registry.join(&code, &pid("a")).await.unwrap();
        let (found, _) = registry.session_of(&pid("a")).await.unwrap();
        assert_eq!(found, code);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_fill_exactly_one_seat() {
        let registry = Arc::new(Registry::with_seed(6, 8));
        let code = registry.create_session().await.unwrap();
        registry.join(&code, &pid("host")).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let code = code.clone();
                tokio::spawn(async move { registry.join(&code, &pid(&format!("guest-{}", i))).await })
            })
            .collect();

        let mut joined = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(j) => {
                    assert_eq!(j.count, 2);
                    joined += 1;
                }
                Err(Error::RoomFull(_)) => full += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!((joined, full), (1, 19));
        assert_eq!(registry.stats().await, RegistryStats { rooms: 1, participants: 2 });
        assert_eq!(registry.lookup(&code).await.unwrap().lock().await.participant_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_leave_and_join_keep_maps_consistent() {
        let registry = Arc::new(Registry::with_seed(6, 10));
        let code = registry.create_session().await.unwrap();
        registry.join(&code, &pid("a")).await.unwrap();

        let leaver = {
            let registry = Arc::clone(&registry);
            let code = code.clone();
            tokio::spawn(async move { registry.remove_participant(&code, &pid("a")).await })
        };
        let joiner = {
            let registry = Arc::clone(&registry);
            let code = code.clone();
            tokio::spawn(async move { registry.join(&code, &pid("b")).await })
        };
        let departure = leaver.await.unwrap().unwrap();
        let joined = joiner.await.unwrap();

        // Either the join landed first, or the room was destroyed under it
        let stats = registry.stats().await;
        match joined {
            Ok(_) => {
                assert!(!departure.destroyed);
                assert_eq!(stats, RegistryStats { rooms: 1, participants: 1 });
            }
            Err(Error::RoomNotFound(_)) => {
                assert!(departure.destroyed);
                assert_eq!(stats, RegistryStats { rooms: 0, participants: 0 });
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}
