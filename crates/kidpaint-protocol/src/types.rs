//! Core protocol types for the KidPaint wire format.
//!
//! Every type here either travels "on the wire" or addresses who a
//! message should go to. The byte layout of each variant lives in
//! [`codec`](crate::Codec); this module only describes the shapes.

use std::fmt;

/// Longest string a message field can carry, in bytes.
pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

/// One-byte type tags that prefix every message on the wire.
///
/// The numbering has gaps because the catalog grew over time; existing
/// clients depend on these exact values.
pub mod tag {
    pub const NAME: u8 = 0;
    pub const PIXELS: u8 = 1;
    pub const CHAT: u8 = 2;
    pub const FULL_SKETCH: u8 = 3;
    pub const CLEAR: u8 = 4;
    pub const WHISPER: u8 = 8;
    pub const GAME_OVER: u8 = 10;
    pub const LOBBY_UPDATE: u8 = 20;
    pub const GAME_STATE: u8 = 21;
    pub const YOUR_TURN: u8 = 22;
    pub const LEADERBOARD: u8 = 23;
    pub const MODE: u8 = 25;
    pub const CLIENT_READY: u8 = 50;
    pub const HOST_START: u8 = 51;
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A unique identifier for one connected session.
///
/// Newtype over `u64` so a session id can't be confused with a pixel
/// coordinate or a score. Never sent on the wire: clients only know each
/// other by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server message.
///
/// Game rules return `(Recipient, ServerMessage)` pairs and the studio
/// actor resolves them against its outbound queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every registered session.
    All,
    /// One specific session.
    Session(SessionId),
    /// Everyone except the given session.
    AllExcept(SessionId),
}

// ---------------------------------------------------------------------------
// Payload building blocks
// ---------------------------------------------------------------------------

/// A canvas coordinate. Signed because clients may send anything;
/// bounds are checked by the canvas, not the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A full canvas snapshot: `size × size` colours, x-major
/// (`cells[x * size + y]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sketch {
    pub size: usize,
    pub cells: Vec<i32>,
}

/// One row of the lobby list: a display name and its ready flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyEntry {
    pub name: String,
    pub ready: bool,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Everything a client may send to the studio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Handshake: the first message on every connection.
    Name { name: String },
    /// Paint `points` with `color`.
    PixelBatch { color: i32, points: Vec<Point> },
    /// Free text. Doubles as a guess during a round.
    Chat { text: String },
    /// Wipe the canvas.
    Clear,
    /// Private message to one display name.
    Whisper { target: String, message: String },
    /// Mark the sender ready in the lobby.
    ClientReady,
    /// Ask the studio to start the game.
    HostStart,
}

impl ClientMessage {
    /// The wire tag for this variant.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Name { .. } => tag::NAME,
            Self::PixelBatch { .. } => tag::PIXELS,
            Self::Chat { .. } => tag::CHAT,
            Self::Clear => tag::CLEAR,
            Self::Whisper { .. } => tag::WHISPER,
            Self::ClientReady => tag::CLIENT_READY,
            Self::HostStart => tag::HOST_START,
        }
    }
}

/// Everything the studio may send to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Pixels someone painted (already bounds-filtered).
    PixelBatch { color: i32, points: Vec<Point> },
    /// A pre-formatted chat line: `"name: text"`, `"SYSTEM: text"` or a
    /// whisper line.
    Chat { text: String },
    /// The whole canvas, sent on join.
    FullSketch(Sketch),
    /// The canvas was wiped.
    Clear,
    /// The drawer queue ran out; back to the lobby.
    GameOver,
    /// Who is in the lobby and who is ready.
    LobbyUpdate { entries: Vec<LobbyEntry> },
    /// Current drawer and seconds left. `time == -1` tells the client to
    /// hide the round HUD.
    GameState { drawer: String, time: i32 },
    /// Whether it's the receiver's turn, with the secret word if so.
    YourTurn { is_turn: bool, word: String },
    /// `"name: score"` lines.
    Leaderboard { entries: Vec<String> },
    /// `true` for Draw & Guess, `false` for Draw Together.
    Mode { draw_and_guess: bool },
}

impl ServerMessage {
    /// A chat line, cut at a character boundary so it always fits in a
    /// wire string.
    pub fn chat_line(mut text: String) -> Self {
        if text.len() > MAX_STRING_BYTES {
            let mut end = MAX_STRING_BYTES;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        Self::Chat { text }
    }

    /// A chat line attributed to the server itself.
    pub fn system(text: impl fmt::Display) -> Self {
        Self::chat_line(format!("SYSTEM: {text}"))
    }

    /// A chat line attributed to a player.
    pub fn chat(from: &str, text: &str) -> Self {
        Self::chat_line(format!("{from}: {text}"))
    }

    /// The wire tag for this variant.
    pub fn tag(&self) -> u8 {
        match self {
            Self::PixelBatch { .. } => tag::PIXELS,
            Self::Chat { .. } => tag::CHAT,
            Self::FullSketch(_) => tag::FULL_SKETCH,
            Self::Clear => tag::CLEAR,
            Self::GameOver => tag::GAME_OVER,
            Self::LobbyUpdate { .. } => tag::LOBBY_UPDATE,
            Self::GameState { .. } => tag::GAME_STATE,
            Self::YourTurn { .. } => tag::YOUR_TURN,
            Self::Leaderboard { .. } => tag::LEADERBOARD,
            Self::Mode { .. } => tag::MODE,
        }
    }
}
