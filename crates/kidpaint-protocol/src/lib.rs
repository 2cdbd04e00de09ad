//! Wire protocol for KidPaint studios.
//!
//! This crate defines the "language" that paint clients and the studio
//! server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Point`],
//!   [`Sketch`], etc.) — the messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`FrameReader`]) — how those messages
//!   are converted to and from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while framing.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the studio
//! (game rules). It doesn't know about sessions or canvases, it only
//! knows how to frame messages.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Studio (rules)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, FrameReader};
pub use error::ProtocolError;
pub use types::{
    tag, ClientMessage, LobbyEntry, MAX_STRING_BYTES, Point, Recipient,
    ServerMessage, SessionId, Sketch,
};
