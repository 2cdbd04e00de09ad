//! Studio configuration, game mode and game phase.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StudioError;

/// Longest studio name shown in discovery replies, in characters.
pub const MAX_STUDIO_NAME_CHARS: usize = 30;

/// Largest accepted canvas edge.
pub const MAX_CANVAS_SIZE: usize = 1024;

/// Secret words used when no list is configured.
pub const DEFAULT_WORDS: &[&str] = &[
    "APPLE", "TREE", "HOUSE", "CAR", "SUN", "COMPUTER", "CAT", "DOG", "PIZZA",
    "FISH", "BOOK",
];

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// What kind of session a studio hosts. Fixed for the studio's lifetime.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// Everyone paints on the shared canvas at once.
    #[default]
    DrawTogether,
    /// Turn-based: one drawer, everyone else guesses the word.
    DrawAndGuess,
}

impl GameMode {
    /// The label advertised to clients ("Draw Together" / "Draw & Guess").
    pub fn label(&self) -> &'static str {
        match self {
            Self::DrawTogether => "Draw Together",
            Self::DrawAndGuess => "Draw & Guess",
        }
    }

    pub fn is_draw_and_guess(&self) -> bool {
        matches!(self, Self::DrawAndGuess)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// Where the studio is in its game lifecycle.
///
/// ```text
/// Lobby ──HostStart──→ RoundActive ──queue empty──→ GameOver
///                          ↑                           │
///                          └────────HostStart──────────┘
/// ```
///
/// - **Lobby**: nobody has started yet. Chat, whispers and ready flags
///   work; in Draw & Guess nobody may paint.
/// - **RoundActive**: a game is running. In Draw Together this just
///   means "started", there are no turns and no timer.
/// - **GameOver**: the last drawer has had their turn. Behaves like the
///   lobby, and a new HostStart begins another game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    #[default]
    Lobby,
    RoundActive,
    GameOver,
}

impl GamePhase {
    /// Returns `true` while a game is running.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::RoundActive)
    }

    /// Returns `true` if a HostStart would begin a game.
    pub fn accepts_start(&self) -> bool {
        !self.is_started()
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::RoundActive => write!(f, "RoundActive"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

// ---------------------------------------------------------------------------
// StudioConfig
// ---------------------------------------------------------------------------

/// Settings for one studio.
///
/// Missing fields in a config file fall back to [`Default`], so
/// `{"mode": "draw-and-guess"}` is a complete config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Name advertised over discovery.
    pub name: String,

    /// Canvas edge length in cells.
    pub canvas_size: usize,

    pub mode: GameMode,

    /// Seconds per Draw & Guess round.
    pub round_secs: u32,

    /// Pool of secret words.
    pub words: Vec<String>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            name: "KidPaint Studio".into(),
            canvas_size: 50,
            mode: GameMode::DrawTogether,
            round_secs: 60,
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl StudioConfig {
    /// Checks every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), StudioError> {
        if self.name.trim().is_empty() {
            return Err(StudioError::InvalidConfig(
                "studio name must not be empty".into(),
            ));
        }
        if self.name.chars().count() > MAX_STUDIO_NAME_CHARS {
            return Err(StudioError::InvalidConfig(format!(
                "studio name is longer than {MAX_STUDIO_NAME_CHARS} characters"
            )));
        }
        if !(1..=MAX_CANVAS_SIZE).contains(&self.canvas_size) {
            return Err(StudioError::InvalidConfig(format!(
                "canvas size must be between 1 and {MAX_CANVAS_SIZE}, got {}",
                self.canvas_size
            )));
        }
        if self.round_secs == 0 {
            return Err(StudioError::InvalidConfig(
                "round length must be at least one second".into(),
            ));
        }
        if self.words.iter().all(|w| w.trim().is_empty()) {
            return Err(StudioError::InvalidConfig(
                "word list must contain at least one word".into(),
            ));
        }
        Ok(())
    }
}
