//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK.  It wraps transport, decoding and configuration
//! errors into a unified enum.

use chatline_models::ModelError;

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL, bad header value).
    #[error("configuration error: {0}")]
    Config(String),

    /// The server refused the session.
    #[error("unauthorized")]
    Unauthorized,

    /// A send was attempted while the socket is not open.
    #[error("not connected")]
    NotConnected,

    /// HTTP request failure (transport, timeout or non-success status).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The server replied with something that is not a valid reply.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for SdkError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        SdkError::WebSocket(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_is_transparent() {
        let err = SdkError::from(ModelError::EmptyMessageId);
        assert_eq!(err.to_string(), "message identifier must not be empty");
    }

    #[test]
    fn unauthorized_display_matches_server_status() {
        assert_eq!(SdkError::Unauthorized.to_string(), "unauthorized");
    }
}
