//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. When you see a
//! `ProtocolError`, the problem is in framing (bad tag, bad length,
//! truncated stream), not in networking or game rules.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The leading type byte is not part of the message catalog.
    #[error("unknown message type: {0}")]
    UnknownTag(u8),

    /// The type byte is valid, but only in the other direction
    /// (e.g., a client sending `FullSketch`).
    #[error("message type {0} is not valid in this direction")]
    WrongDirection(u8),

    /// The stream ended in the middle of a message.
    #[error("stream ended mid-message ({buffered} bytes buffered)")]
    Truncated { buffered: usize },

    /// A string is longer than the 16-bit length prefix can express.
    #[error("string of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),

    /// The message decoded but violates protocol rules: negative counts,
    /// invalid UTF-8, oversized batches, mismatched sketch sizes.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Reading from the underlying stream failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}
