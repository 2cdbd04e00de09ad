//! Session type: the server's record of one named player.

use kidpaint_protocol::SessionId;

/// A single player's session in a studio.
///
/// Created when the name handshake succeeds and dropped when the
/// connection goes away. There is no reconnection: a player who drops
/// and comes back is a brand-new session with a score of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Which connection this session belongs to.
    pub id: SessionId,

    /// Display name, unique within the studio. Fixed at handshake.
    pub name: String,

    /// Lobby ready flag. Set by `ClientReady`, cleared at game over.
    pub ready: bool,

    /// Points earned so far.
    pub score: u32,

    /// Position in join order. Strictly increasing across the registry's
    /// lifetime, never reused.
    pub join_seq: u64,
}
