//! Common error types for Tandem

use thiserror::Error;

/// Common result type for Tandem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types surfaced by the room engine and its configuration layer
///
/// Rejections raised while handling a client command are delivered to the
/// originating participant as an `error` notification. None of them end the
/// session or the connection.
#[derive(Error, Debug)]
pub enum Error {
    /// No session matches the requested code
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Session already holds two participants
    #[error("Room {0} is full")]
    RoomFull(String),

    /// Action needs a session but the participant is not bound to one
    #[error("Not in a room")]
    NotInRoom,

    /// Participant is already bound to a session
    #[error("Already in room {0}")]
    AlreadyInRoom(String),

    /// Action attempted outside the phase that accepts it
    #[error("Action not valid in current state: {0}")]
    InvalidPhase(String),

    /// Submission rejected before reaching the session
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// Could not find an unused room code
    #[error("Could not allocate a room code after {0} attempts")]
    CodeSpaceExhausted(usize),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
