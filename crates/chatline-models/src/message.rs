//! Chat messages and the cursor that tracks the last one displayed.
//!
//! A [`MessageId`] is opaque to the client: it is compared for equality and
//! echoed back to the server as a [`Cursor`], never parsed. Servers emit it
//! either as a JSON string (`"4f1a…"`) or as an integer; both decode to the
//! same textual form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

/// Server-assigned identifier of a chat message.
///
/// # Examples
///
/// ```
/// use chatline_models::MessageId;
///
/// let id: MessageId = serde_json::from_str("42").unwrap();
/// assert_eq!(id.as_str(), "42");
///
/// let id: MessageId = serde_json::from_str("\"4f1a\"").unwrap();
/// assert_eq!(id.to_string(), "4f1a");
/// ```
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Create a `MessageId`, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::EmptyMessageId);
        }
        Ok(Self(id))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MessageId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<u64> for MessageId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Unsigned(n) => n.to_string(),
            Raw::Signed(n) => n.to_string(),
        };
        MessageId::new(text).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// A single message of the conversation.
///
/// The identifier travels as `_id` (the field name used by the chat
/// server); `id` is accepted on input as well.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Server-assigned identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: MessageId,
    /// Display name of the sender.
    #[serde(default)]
    pub from: String,
    /// Message text.
    #[serde(default)]
    pub body: String,
}

impl ChatMessage {
    /// Convenience constructor.
    pub fn new(id: MessageId, from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            from: from.into(),
            body: body.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Marker of the most recently displayed message.
///
/// Starts empty; only moves forward to the identifier the server handed us
/// last. It is never interpreted, only echoed back on the next read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor(Option<MessageId>);

impl Cursor {
    /// A cursor positioned before the first message.
    pub fn start() -> Self {
        Self(None)
    }

    /// The last displayed message id, if any.
    pub fn position(&self) -> Option<&MessageId> {
        self.0.as_ref()
    }

    /// `true` until the first batch has been displayed.
    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }

    /// Move the cursor to `id`.
    pub fn advance_to(&mut self, id: MessageId) {
        self.0 = Some(id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
