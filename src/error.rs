//! Error types for `hubline` connection operations.

use crate::transport::TransportError;

/// Errors emitted by [`crate::Connection`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// `send` or `request` was called before any endpoint was connected.
    #[error("Connection is not initialized.")]
    NotInitialized,
    /// `connect` was called with an empty URL.
    #[error("connection url must not be empty")]
    EmptyUrl,
    /// The transport failed to start, stop or invoke.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The value returned for a request was not a response envelope.
    #[error("failed to decode response envelope")]
    Decode(#[source] serde_json::Error),
}

/// Result type for [`crate::Connection`] operations.
pub type Result<T> = std::result::Result<T, ConnectionError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn not_initialized_message_is_verbatim() {
        assert_eq!(
            ConnectionError::NotInitialized.to_string(),
            "Connection is not initialized."
        );
    }

    #[test]
    fn transport_errors_pass_through_unchanged() {
        let err = ConnectionError::from(TransportError::Invocation("boom".into()));
        assert_eq!(err.to_string(), "invocation failed: boom");
        assert!(matches!(
            err,
            ConnectionError::Transport(TransportError::Invocation(ref msg)) if msg == "boom"
        ));
    }

    #[test]
    fn decode_error_exposes_source() {
        let source = serde_json::from_str::<u8>("nope").expect_err("invalid json");
        let err = ConnectionError::Decode(source);
        assert!(err.source().is_some());
    }
}
