//! The KidPaint studio: shared canvas, game rules and the actor that
//! serializes every change to them.
//!
//! One studio runs as a single Tokio task (actor model). Connection
//! handlers talk to it through a [`StudioHandle`]; the actor owns the
//! session registry, the canvas, the game director and the round timer.
//!
//! # Key types
//!
//! - [`StudioHandle`] — send commands to a running studio actor
//! - [`GameDirector`] — the game rules as plain synchronous state
//! - [`CanvasState`] — the N×N colour grid
//! - [`GamePhase`] / [`GameMode`] — where the game is and what kind it is
//! - [`StudioConfig`] — studio settings (name, canvas size, words, ...)

mod canvas;
mod config;
mod director;
mod error;
mod studio;

pub use canvas::CanvasState;
pub use config::{
    DEFAULT_WORDS, GameMode, GamePhase, MAX_CANVAS_SIZE, MAX_STUDIO_NAME_CHARS,
    StudioConfig,
};
pub use director::{
    DRAWER_POINTS, GUESSER_POINTS, GameDirector, MIN_PLAYERS, Outbox,
    RoundState, TimerCommand,
};
pub use error::StudioError;
pub use studio::{SessionSender, StudioHandle, StudioInfo, spawn_studio};
