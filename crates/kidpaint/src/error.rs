//! Unified error type for the KidPaint server.

use kidpaint_protocol::ProtocolError;
use kidpaint_session::SessionError;
use kidpaint_studio::StudioError;
use kidpaint_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum KidPaintError {
    /// A transport-level error (bind, accept).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (decode, truncated stream, read failure).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (name rejected).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A studio-level error (bad config, actor gone).
    #[error(transparent)]
    Studio(#[from] StudioError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::BindFailed {
            addr: "0.0.0.0:12345".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        let kp_err: KidPaintError = err.into();
        assert!(matches!(kp_err, KidPaintError::Transport(_)));
        assert!(kp_err.to_string().contains("0.0.0.0:12345"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownTag(99);
        let kp_err: KidPaintError = err.into();
        assert!(matches!(kp_err, KidPaintError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NameTaken("Alice".into());
        let kp_err: KidPaintError = err.into();
        assert!(matches!(kp_err, KidPaintError::Session(_)));
    }

    #[test]
    fn test_from_studio_error() {
        let kp_err: KidPaintError = StudioError::Unavailable.into();
        assert!(matches!(kp_err, KidPaintError::Studio(_)));
        assert_eq!(kp_err.to_string(), "studio is unavailable");
    }
}
