//! Request and reply payloads exchanged with the chat server.
//!
//! The same [`ServerReply`] shape is used for every server response: socket
//! frames, long-poll reads and write acknowledgements. Which fields are
//! present tells the client what happened.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;
use crate::message::{ChatMessage, MessageId};

/// `textStatus` value the server uses for a missing or expired session.
pub const UNAUTHORIZED_STATUS: &str = "unauthorized";

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// A message the user submitted.
///
/// Serialised as a JSON socket frame or as the form body of
/// `POST /message`. The anti-forgery token uses the server's `_xsrf` name
/// and is omitted when the client has none.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Raw text from the input, not validated or trimmed.
    pub body: String,
    /// Anti-forgery token echoed from the cookie of the same name.
    #[serde(rename = "_xsrf", default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// Query string of a long-poll read (`GET /message`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PollRequest {
    /// Anti-forgery token.
    #[serde(rename = "_xsrf", default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    /// Last message the client displayed; absent on the first read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<MessageId>,
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Any JSON object the server sends back.
///
/// ```
/// use chatline_models::{Alert, ServerReply};
///
/// let reply = ServerReply::from_json(r#"{"error":1,"textStatus":"unauthorized"}"#).unwrap();
/// assert_eq!(reply.alert(), Some(Alert::Unauthorized));
///
/// let reply = ServerReply::from_json(r#"{"messages":[{"_id":"1","from":"a","body":"b"}]}"#).unwrap();
/// assert_eq!(reply.messages.map(|m| m.len()), Some(1));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerReply {
    /// New messages, oldest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    /// Failure flag. The server sends `1`, `true` or nothing.
    #[serde(
        default,
        deserialize_with = "truthy",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub error: bool,
    /// Human-readable status accompanying a failure.
    #[serde(rename = "textStatus", default, skip_serializing_if = "Option::is_none")]
    pub text_status: Option<String>,
    /// Identifier of a message the server just stored (write acknowledgement).
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Sender of an acknowledged message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Body of an acknowledged message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Something the server wants the user to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// The session is not (or no longer) authorised. Blocks interaction.
    Unauthorized,
    /// A server-side failure with its status text. Informational only.
    Failure(String),
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::Unauthorized => f.write_str(UNAUTHORIZED_STATUS),
            Alert::Failure(status) => f.write_str(status),
        }
    }
}

impl ServerReply {
    /// Decode a reply from a JSON text.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a reply from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// A reply carrying a batch of messages.
    pub fn batch(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::default()
        }
    }

    /// A failure reply with the given status text.
    pub fn failure(text_status: impl Into<String>) -> Self {
        Self {
            error: true,
            text_status: Some(text_status.into()),
            ..Self::default()
        }
    }

    /// The reply the server sends when the session is missing.
    pub fn unauthorized() -> Self {
        Self::failure(UNAUTHORIZED_STATUS)
    }

    /// A write acknowledgement echoing the stored message.
    pub fn ack(message: &ChatMessage) -> Self {
        Self {
            id: Some(message.id.clone()),
            from: Some(message.from.clone()),
            body: Some(message.body.clone()),
            ..Self::default()
        }
    }

    /// `true` when `textStatus` is `"unauthorized"`, whatever `error` says.
    pub fn is_unauthorized(&self) -> bool {
        self.text_status.as_deref() == Some(UNAUTHORIZED_STATUS)
    }

    /// The alert this reply raises, if any.
    ///
    /// Authorization failures take precedence; a generic failure needs both
    /// the `error` flag and a status text.
    pub fn alert(&self) -> Option<Alert> {
        if self.is_unauthorized() {
            return Some(Alert::Unauthorized);
        }
        match (&self.text_status, self.error) {
            (Some(status), true) => Some(Alert::Failure(status.clone())),
            _ => None,
        }
    }

    /// Identifier of the stored message when this is a successful write.
    pub fn accepted_id(&self) -> Option<&MessageId> {
        self.id.as_ref()
    }
}

/// Interpret a JSON value the way a browser `if (value)` would.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_message_uses_xsrf_field() {
        let msg = OutgoingMessage {
            body: "hello".into(),
            csrf_token: Some("tok".into()),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, serde_json::json!({"body": "hello", "_xsrf": "tok"}));
    }

    #[test]
    fn outgoing_message_omits_missing_token() {
        let msg = OutgoingMessage {
            body: String::new(),
            csrf_token: None,
        };
        assert_eq!(serde_json::to_string(&msg).unwrap(), r#"{"body":""}"#);
    }

    #[test]
    fn poll_request_omits_cursor_on_first_read() {
        let req = PollRequest {
            csrf_token: Some("tok".into()),
            cursor: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), serde_json::json!({"_xsrf": "tok"}));
    }

    #[test]
    fn unauthorized_without_error_flag_still_alerts() {
        let reply = ServerReply::from_json(r#"{"textStatus":"unauthorized"}"#).unwrap();
        assert_eq!(reply.alert(), Some(Alert::Unauthorized));
    }

    #[test]
    fn failure_requires_error_flag_and_status() {
        let reply = ServerReply::from_json(r#"{"error":1,"textStatus":"Bad input data"}"#).unwrap();
        assert_eq!(reply.alert(), Some(Alert::Failure("Bad input data".into())));

        let reply = ServerReply::from_json(r#"{"textStatus":"just saying"}"#).unwrap();
        assert_eq!(reply.alert(), None);

        let reply = ServerReply::from_json(r#"{"error":true}"#).unwrap();
        assert_eq!(reply.alert(), None);
    }

    #[test]
    fn error_flag_follows_truthiness() {
        for (raw, expected) in [
            (r#"{"error":0}"#, false),
            (r#"{"error":1}"#, true),
            (r#"{"error":false}"#, false),
            (r#"{"error":"yes"}"#, true),
            (r#"{"error":""}"#, false),
            (r#"{"error":null}"#, false),
        ] {
            assert_eq!(ServerReply::from_json(raw).unwrap().error, expected, "{raw}");
        }
    }

    #[test]
    fn alert_displays_status_text() {
        assert_eq!(Alert::Unauthorized.to_string(), "unauthorized");
        assert_eq!(Alert::Failure("disk full".into()).to_string(), "disk full");
    }

    #[test]
    fn write_ack_exposes_id() {
        let reply = ServerReply::from_json(r#"{"_id":"77","from":"ada","body":"hi"}"#).unwrap();
        assert_eq!(reply.accepted_id().map(MessageId::as_str), Some("77"));
        assert!(reply.messages.is_none());
    }

    #[test]
    fn empty_object_is_a_rejected_write() {
        let reply = ServerReply::from_json("{}").unwrap();
        assert!(reply.accepted_id().is_none());
        assert!(reply.messages.is_none());
        assert_eq!(reply.alert(), None);
    }

    #[test]
    fn null_messages_is_absent() {
        let reply = ServerReply::from_json(r#"{"messages":null}"#).unwrap();
        assert!(reply.messages.is_none());
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            ServerReply::from_json("<html>"),
            Err(ModelError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn ack_constructor_mirrors_message() {
        let msg = ChatMessage::new("3".parse().unwrap(), "ada", "hi");
        let reply = ServerReply::ack(&msg);
        let back = ServerReply::from_json(&serde_json::to_string(&reply).unwrap()).unwrap();
        assert_eq!(back.accepted_id(), Some(&msg.id));
        assert_eq!(back.body.as_deref(), Some("hi"));
    }
}
