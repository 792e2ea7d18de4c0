//! # Tandem Common Library
//!
//! Room engine for two-participant preference matching:
//! - Session state machine (submission, rating, runoff rounds)
//! - Session registry (room codes, membership)
//! - Result classification
//! - Command/notification protocol and lifecycle EventBus
//! - Configuration loading
//!
//! Transport-free: adapters feed [`events::Command`]s into
//! [`lobby::Lobby::handle`] and deliver the returned [`events::Outbound`]s.

pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod lobby;
pub mod model;
pub mod registry;
pub mod session;
pub mod shuffle;

pub use error::{Error, Result};
pub use lobby::Lobby;
pub use model::{Choice, Item, ParticipantId, Phase};
