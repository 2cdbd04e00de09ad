//! # KidPaint
//!
//! Multiplayer drawing studio server.
//!
//! Clients connect over TCP, share one pixel canvas, chat and whisper,
//! and optionally play Draw & Guess: one drawer per round, everyone else
//! guesses the secret word against a countdown. A UDP responder lets
//! clients on the LAN find the studio.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kidpaint::prelude::*;
//!
//! # async fn start() -> Result<(), KidPaintError> {
//! let server = KidPaintServer::builder()
//!     .bind("0.0.0.0:12345")
//!     .config(StudioConfig {
//!         mode: GameMode::DrawAndGuess,
//!         ..StudioConfig::default()
//!     })
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod discovery;
mod error;
mod handler;
mod server;

pub use discovery::{
    DISCOVERY_PORT, DISCOVERY_REQUEST, DiscoveryResponder, discovery_reply,
};
pub use error::KidPaintError;
pub use server::{DEFAULT_PORT, KidPaintServer, KidPaintServerBuilder};

/// Everything needed to run a studio or talk to one.
pub mod prelude {
    pub use crate::{
        DEFAULT_PORT, DISCOVERY_PORT, DISCOVERY_REQUEST, KidPaintError,
        KidPaintServer, KidPaintServerBuilder,
    };
    pub use kidpaint_protocol::{
        ClientMessage, Codec, FrameReader, LobbyEntry, Point, ProtocolError,
        ServerMessage, SessionId, Sketch,
    };
    pub use kidpaint_session::SessionError;
    pub use kidpaint_studio::{
        GameMode, GamePhase, StudioConfig, StudioError, StudioHandle,
        StudioInfo,
    };
    pub use kidpaint_transport::TransportError;
}
