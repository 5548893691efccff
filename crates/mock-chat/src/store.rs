//! In-memory conversation.

use std::collections::VecDeque;

use chatline_models::{ChatMessage, MessageId};

/// The most recent messages, oldest first, with sequential ids.
#[derive(Debug)]
pub struct ChatStore {
    messages: VecDeque<ChatMessage>,
    next_id: u64,
    limit: usize,
}

impl ChatStore {
    /// Empty store keeping at most `limit` messages.
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(limit),
            next_id: 1,
            limit,
        }
    }

    /// Store a message and return it with its new id.
    pub fn push(&mut self, from: &str, body: &str) -> ChatMessage {
        let id = MessageId::from(self.next_id);
        self.next_id += 1;

        let message = ChatMessage::new(id, from, body);
        self.messages.push_back(message.clone());
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
        message
    }

    /// Messages after `cursor`.
    ///
    /// Without a cursor, or with one that is no longer held, the whole
    /// history is returned.
    pub fn since(&self, cursor: Option<&MessageId>) -> Vec<ChatMessage> {
        let start = cursor
            .and_then(|c| self.messages.iter().position(|m| &m.id == c))
            .map_or(0, |i| i + 1);
        self.messages.iter().skip(start).cloned().collect()
    }

    /// Number of messages held.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// `true` when nothing has been posted yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(messages: &[ChatMessage]) -> Vec<String> {
        messages.iter().map(|m| m.id.to_string()).collect()
    }

    #[test]
    fn ids_are_sequential() {
        let mut store = ChatStore::new(10);
        assert_eq!(store.push("ada", "a").id.as_str(), "1");
        assert_eq!(store.push("bob", "b").id.as_str(), "2");
    }

    #[test]
    fn since_returns_messages_after_cursor() {
        let mut store = ChatStore::new(10);
        for body in ["a", "b", "c"] {
            store.push("ada", body);
        }
        let cursor: MessageId = "1".parse().unwrap();
        assert_eq!(ids(&store.since(Some(&cursor))), vec!["2", "3"]);
        assert_eq!(ids(&store.since(None)), vec!["1", "2", "3"]);

        let latest: MessageId = "3".parse().unwrap();
        assert!(store.since(Some(&latest)).is_empty());
    }

    #[test]
    fn history_is_capped() {
        let mut store = ChatStore::new(2);
        for body in ["a", "b", "c"] {
            store.push("ada", body);
        }
        assert_eq!(store.len(), 2);
        assert_eq!(ids(&store.since(None)), vec!["2", "3"]);
    }

    #[test]
    fn unknown_cursor_replays_history() {
        let mut store = ChatStore::new(2);
        for body in ["a", "b", "c"] {
            store.push("ada", body);
        }
        let expired: MessageId = "1".parse().unwrap();
        assert_eq!(ids(&store.since(Some(&expired))), vec!["2", "3"]);
    }
}
