use chatline_sdk::ChatMessage;
use chrono::Local;
use std::time::Instant;

/// A message as shown in the conversation pane.
#[derive(Debug, Clone)]
pub struct ChatLine {
    pub from: String,
    pub body: String,
    pub timestamp: String,
    /// When the line appeared; drives the reveal highlight.
    pub revealed_at: Instant,
}

impl From<&ChatMessage> for ChatLine {
    fn from(message: &ChatMessage) -> Self {
        Self {
            from: message.from.clone(),
            body: message.body.clone(),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            revealed_at: Instant::now(),
        }
    }
}

/// Which client variant drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Variant {
    Socket,
    Polling,
}

pub trait AppController {
    fn update(&mut self, action: super::tui::Action);
    fn render(&mut self, f: &mut ratatui::Frame);
    fn should_quit(&self) -> bool;
}
