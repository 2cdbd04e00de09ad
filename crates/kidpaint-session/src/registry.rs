//! The session registry: every named player in a studio, in join order.
//!
//! # Ordering
//!
//! Lobby lists, leaderboards and, most importantly, the Draw & Guess
//! drawer queue are all built by iterating the registry. Sessions are
//! kept in a `Vec` sorted by join sequence so that iteration order is
//! explicit and deterministic rather than whatever a hash map yields.
//! Studios hold a handful of players, so the linear lookups are fine.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself. It is owned by the
//! studio actor task and only touched from inside that task.

use kidpaint_protocol::{LobbyEntry, SessionId};

use crate::{Session, SessionError};

/// Longest display name accepted, in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Tracks all named sessions of one studio.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ set_ready() / add_score() ──→ remove()
///                     ↑
///               reset_ready() (game over)
/// ```
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Sessions in join order.
    sessions: Vec<Session>,

    /// Next join sequence number to hand out.
    next_seq: u64,
}

impl SessionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session after a successful name handshake.
    ///
    /// New sessions start with score 0 and ready = false.
    ///
    /// # Errors
    /// - [`SessionError::InvalidName`] — empty or longer than
    ///   [`MAX_NAME_LEN`] bytes
    /// - [`SessionError::AlreadyRegistered`] — this id already has a name
    /// - [`SessionError::NameTaken`] — another session uses this name
    pub fn register(
        &mut self,
        id: SessionId,
        name: &str,
    ) -> Result<&Session, SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::InvalidName(
                "name must not be empty".into(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(SessionError::InvalidName(format!(
                "name is longer than {MAX_NAME_LEN} bytes"
            )));
        }
        if self.contains(id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        if self.find_by_name(name).is_some() {
            return Err(SessionError::NameTaken(name.to_string()));
        }

        let join_seq = self.next_seq;
        self.next_seq += 1;
        self.sessions.push(Session {
            id,
            name: name.to_string(),
            ready: false,
            score: 0,
            join_seq,
        });

        tracing::info!(session_id = %id, %name, "session registered");
        Ok(&self.sessions[self.sessions.len() - 1])
    }

    /// Removes a session, returning it if it existed.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        let session = self.sessions.remove(index);
        tracing::info!(session_id = %id, name = %session.name, "session removed");
        Some(session)
    }

    /// Looks up a session by id.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Looks up a session by exact display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.name == name)
    }

    /// The display name of a session, if registered.
    pub fn name_of(&self, id: SessionId) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    /// Returns `true` if the id is registered.
    pub fn contains(&self, id: SessionId) -> bool {
        self.get(id).is_some()
    }

    /// Marks a session ready.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the id isn't registered.
    pub fn set_ready(&mut self, id: SessionId) -> Result<(), SessionError> {
        let session = self.get_mut(id)?;
        session.ready = true;
        Ok(())
    }

    /// Clears every ready flag (used when a game ends).
    pub fn reset_ready(&mut self) {
        for session in &mut self.sessions {
            session.ready = false;
        }
    }

    /// Adds points to a session's score and returns the new total.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the id isn't registered.
    pub fn add_score(
        &mut self,
        id: SessionId,
        points: u32,
    ) -> Result<u32, SessionError> {
        let session = self.get_mut(id)?;
        session.score = session.score.saturating_add(points);
        Ok(session.score)
    }

    /// Session ids in join order.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|s| s.id).collect()
    }

    /// Iterates sessions in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// The lobby list: every name with its ready flag.
    pub fn lobby_entries(&self) -> Vec<LobbyEntry> {
        self.sessions
            .iter()
            .map(|s| LobbyEntry {
                name: s.name.clone(),
                ready: s.ready,
            })
            .collect()
    }

    /// The leaderboard as `"name: score"` lines.
    pub fn leaderboard(&self) -> Vec<String> {
        self.sessions
            .iter()
            .map(|s| format!("{}: {}", s.name, s.score))
            .collect()
    }

    /// Returns the number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn get_mut(&mut self, id: SessionId) -> Result<&mut Session, SessionError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SessionError::NotFound(id))
    }
}

// =========================================================================
// Tests
// =========================================================================
