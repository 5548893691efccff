//! The seam between the chat clients and whatever displays them.
//!
//! Clients never draw anything themselves; they call [`ChatView`] methods.
//! Two implementations ship with the SDK: `Vec<ViewEvent>` records every
//! call (tests, headless runs) and `UnboundedSender<ViewEvent>` forwards
//! them to a UI task.

use chatline_models::ChatMessage;
use tokio::sync::mpsc::UnboundedSender;

/// User-visible effects a chat client can request.
pub trait ChatView {
    /// Enable or disable the input controls.
    fn set_controls_enabled(&mut self, enabled: bool);

    /// Append a message to the conversation and reveal it.
    fn append_message(&mut self, message: &ChatMessage);

    /// Show a notification the user has to acknowledge.
    fn notify(&mut self, text: &str);

    /// Re-select the input after a submission, clearing it when `clear`.
    fn reset_input(&mut self, clear: bool);

    /// Connection status line (e.g. `"open"`, `"polling"`).
    fn show_status(&mut self, _status: &str) {}
}

/// One recorded [`ChatView`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// `set_controls_enabled`
    ControlsEnabled(bool),
    /// `append_message`
    Appended(ChatMessage),
    /// `notify`
    Notified(String),
    /// `reset_input`
    InputReset {
        /// Whether the input was cleared.
        clear: bool,
    },
    /// `show_status`
    Status(String),
}

impl ChatView for Vec<ViewEvent> {
    fn set_controls_enabled(&mut self, enabled: bool) {
        self.push(ViewEvent::ControlsEnabled(enabled));
    }

    fn append_message(&mut self, message: &ChatMessage) {
        self.push(ViewEvent::Appended(message.clone()));
    }

    fn notify(&mut self, text: &str) {
        self.push(ViewEvent::Notified(text.to_string()));
    }

    fn reset_input(&mut self, clear: bool) {
        self.push(ViewEvent::InputReset { clear });
    }

    fn show_status(&mut self, status: &str) {
        self.push(ViewEvent::Status(status.to_string()));
    }
}

// A closed receiver means the UI is gone; events are dropped.
impl ChatView for UnboundedSender<ViewEvent> {
    fn set_controls_enabled(&mut self, enabled: bool) {
        let _ = self.send(ViewEvent::ControlsEnabled(enabled));
    }

    fn append_message(&mut self, message: &ChatMessage) {
        let _ = self.send(ViewEvent::Appended(message.clone()));
    }

    fn notify(&mut self, text: &str) {
        let _ = self.send(ViewEvent::Notified(text.to_string()));
    }

    fn reset_input(&mut self, clear: bool) {
        let _ = self.send(ViewEvent::InputReset { clear });
    }

    fn show_status(&mut self, status: &str) {
        let _ = self.send(ViewEvent::Status(status.to_string()));
    }
}

impl<V: ChatView + ?Sized> ChatView for &mut V {
    fn set_controls_enabled(&mut self, enabled: bool) {
        (**self).set_controls_enabled(enabled);
    }

    fn append_message(&mut self, message: &ChatMessage) {
        (**self).append_message(message);
    }

    fn notify(&mut self, text: &str) {
        (**self).notify(text);
    }

    fn reset_input(&mut self, clear: bool) {
        (**self).reset_input(clear);
    }

    fn show_status(&mut self, status: &str) {
        (**self).show_status(status);
    }
}
