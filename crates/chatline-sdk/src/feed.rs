//! De-duplicating message feed.
//!
//! [`Feed`] remembers which message ids it has already handed to the view
//! and where the cursor stands. Re-delivered messages are skipped silently;
//! they are never re-rendered and never move earlier entries.

use std::collections::HashSet;

use chatline_models::{ChatMessage, Cursor, MessageId};
use tracing::debug;

use crate::view::ChatView;

/// Rendered-id set plus cursor.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    rendered: HashSet<MessageId>,
    cursor: Cursor,
}

impl Feed {
    /// An empty feed positioned before the first message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a batch (oldest first) and advance the cursor.
    ///
    /// Every message whose id has not been seen is appended to `view`.
    /// After a non-empty batch the cursor moves to the id of the batch's
    /// last element, even when that element was a duplicate. An empty batch
    /// changes nothing.
    ///
    /// Returns how many messages were newly rendered.
    pub fn show<V: ChatView + ?Sized>(&mut self, view: &mut V, batch: Vec<ChatMessage>) -> usize {
        let Some(last) = batch.last().map(|m| m.id.clone()) else {
            return 0;
        };

        let mut shown = 0;
        for message in &batch {
            if self.rendered.insert(message.id.clone()) {
                view.append_message(message);
                shown += 1;
            }
        }
        self.cursor.advance_to(last);

        debug!(
            received = batch.len(),
            shown,
            cursor = ?self.cursor.position().map(MessageId::as_str),
            "batch processed"
        );
        shown
    }

    /// Current cursor.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// `true` if the message with `id` has been rendered.
    pub fn contains(&self, id: &MessageId) -> bool {
        self.rendered.contains(id)
    }

    /// Number of distinct messages rendered so far.
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    /// `true` before anything has been rendered.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewEvent;

    fn msg(id: &str) -> ChatMessage {
        ChatMessage::new(id.parse().unwrap(), "ada", format!("body {id}"))
    }

    fn appended_ids(events: &[ViewEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Appended(m) => Some(m.id.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn overlapping_batches_render_each_id_once() {
        let mut feed = Feed::new();
        let mut view: Vec<ViewEvent> = Vec::new();

        assert_eq!(feed.show(&mut view, vec![msg("1")]), 1);
        assert_eq!(feed.show(&mut view, vec![msg("1"), msg("2")]), 1);

        assert_eq!(appended_ids(&view), vec!["1", "2"]);
        assert_eq!(feed.cursor().position().map(MessageId::as_str), Some("2"));
    }

    #[test]
    fn cursor_follows_last_element_even_if_duplicate() {
        let mut feed = Feed::new();
        let mut view: Vec<ViewEvent> = Vec::new();
        feed.show(&mut view, vec![msg("a"), msg("b")]);
        feed.show(&mut view, vec![msg("c"), msg("a")]);

        assert_eq!(appended_ids(&view), vec!["a", "b", "c"]);
        assert_eq!(feed.cursor().position().map(MessageId::as_str), Some("a"));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut feed = Feed::new();
        let mut view: Vec<ViewEvent> = Vec::new();
        assert_eq!(feed.show(&mut view, Vec::new()), 0);
        assert!(feed.cursor().is_start());
        assert!(view.is_empty());

        feed.show(&mut view, vec![msg("1")]);
        feed.show(&mut view, Vec::new());
        assert_eq!(feed.cursor().position().map(MessageId::as_str), Some("1"));
    }

    #[test]
    fn duplicates_inside_one_batch_are_skipped() {
        let mut feed = Feed::new();
        let mut view: Vec<ViewEvent> = Vec::new();
        assert_eq!(feed.show(&mut view, vec![msg("1"), msg("1"), msg("2")]), 2);
        assert_eq!(feed.len(), 2);
        assert!(feed.contains(&"1".parse().unwrap()));
    }

    #[test]
    fn any_redelivery_order_renders_each_id_once() {
        let batches = [
            vec!["3", "1"],
            vec!["1", "2", "3"],
            vec!["2"],
            vec!["4", "4", "1"],
            vec![],
            vec!["5", "2"],
        ];
        let mut feed = Feed::new();
        let mut view: Vec<ViewEvent> = Vec::new();
        for batch in batches {
            feed.show(&mut view, batch.into_iter().map(msg).collect());
        }

        let ids = appended_ids(&view);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(ids, vec!["3", "1", "2", "4", "5"]);
        assert_eq!(feed.cursor().position().map(MessageId::as_str), Some("2"));
    }
}
