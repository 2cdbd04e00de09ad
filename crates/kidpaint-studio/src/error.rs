//! Error types for the studio layer.

use kidpaint_session::SessionError;

/// Errors that can occur during studio operations.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// A join was rejected by the session registry.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The studio configuration failed validation.
    #[error("invalid studio config: {0}")]
    InvalidConfig(String),

    /// A sketch was restored into a canvas of a different size.
    #[error("sketch is {actual}x{actual}, canvas is {expected}x{expected}")]
    SketchSizeMismatch { expected: usize, actual: usize },

    /// The studio's command channel is closed (actor stopped).
    #[error("studio is unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_is_passed_through() {
        let err: StudioError = SessionError::NameTaken("Alice".into()).into();
        assert_eq!(err.to_string(), "name 'Alice' is already taken");
        assert!(matches!(err, StudioError::Session(_)));
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = StudioError::SketchSizeMismatch {
            expected: 50,
            actual: 10,
        };
        assert_eq!(err.to_string(), "sketch is 10x10, canvas is 50x50");
    }
}
