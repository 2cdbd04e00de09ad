//! Error types for the session layer.

use kidpaint_protocol::SessionId;

/// Errors that can occur during session registration and updates.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Another connected session already uses this display name.
    #[error("name '{0}' is already taken")]
    NameTaken(String),

    /// The display name is empty or too long.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// This connection already completed its handshake.
    #[error("session {0} is already registered")]
    AlreadyRegistered(SessionId),

    /// No session exists with the given id.
    #[error("session {0} not found")]
    NotFound(SessionId),
}
