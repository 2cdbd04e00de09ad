//! Player session registry for KidPaint studios.
//!
//! This crate tracks who is connected to a studio:
//!
//! 1. **Identity** — each session has a unique, immutable display name
//! 2. **Lobby state** — the ready flag shown in the lobby list
//! 3. **Score** — points earned in Draw & Guess rounds
//!
//! # How it fits in the stack
//!
//! ```text
//! Studio Layer (above)  ← asks the registry who's here, in join order
//!     ↕
//! Session Layer (this crate)  ← names, ready flags, scores
//!     ↕
//! Protocol Layer (below)  ← provides SessionId, LobbyEntry
//! ```

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::{SessionRegistry, MAX_NAME_LEN};
pub use session::Session;
