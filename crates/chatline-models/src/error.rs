//! Error types for the `chatline-models` crate.
//!
//! Decoding helpers in this crate return variants of [`ModelError`].

/// Errors produced when decoding or validating wire types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A frame or response body was not the JSON shape we expect.
    #[error("malformed frame: {reason}")]
    MalformedFrame {
        /// Human-readable explanation (usually the decoder message).
        reason: String,
    },

    /// A message identifier was empty.
    #[error("message identifier must not be empty")]
    EmptyMessageId,
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::MalformedFrame {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_malformed() {
        let err = ModelError::MalformedFrame {
            reason: "expected value".into(),
        };
        assert_eq!(err.to_string(), "malformed frame: expected value");
    }

    #[test]
    fn error_display_empty_id() {
        assert_eq!(
            ModelError::EmptyMessageId.to_string(),
            "message identifier must not be empty"
        );
    }

    #[test]
    fn serde_error_converts_to_malformed() {
        let err: ModelError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ModelError::MalformedFrame { .. }));
    }
}
