//! Message submission shared by both client variants.
//!
//! [`submit`] wraps one send attempt with the input-control choreography:
//! disable, transmit, re-select (clearing on success), re-enable. What
//! "transmit" means is up to the caller: a socket frame or an HTTP write.

use std::future::Future;

use chatline_models::{Alert, MessageId, OutgoingMessage, ServerReply};
use tracing::{info, warn};

use crate::cookie::CookieJar;
use crate::error::SdkError;
use crate::view::ChatView;

/// Package the input text and the anti-forgery token.
///
/// The text is sent as typed; empty input is not rejected.
pub fn compose(text: &str, jar: &CookieJar) -> OutgoingMessage {
    OutgoingMessage {
        body: text.to_string(),
        csrf_token: jar.csrf_token(),
    }
}

/// How a submission attempt ended.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The frame was written to the socket; no acknowledgement is awaited.
    Sent,
    /// The server stored the message under this id.
    Accepted(MessageId),
    /// The server answered without an id.
    Rejected(ServerReply),
    /// The request never completed.
    Failed(SdkError),
}

impl SubmitOutcome {
    /// Classify a write reply: an id means the message was stored.
    pub fn from_reply(reply: ServerReply) -> Self {
        match reply.accepted_id() {
            Some(id) => SubmitOutcome::Accepted(id.clone()),
            None => SubmitOutcome::Rejected(reply),
        }
    }

    /// `true` for [`Sent`](Self::Sent) and [`Accepted`](Self::Accepted).
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Sent | SubmitOutcome::Accepted(_))
    }
}

/// Run one submission attempt against `view`.
///
/// Controls are disabled for the duration of `attempt` and re-enabled
/// afterwards, unless the server refused the session. On success the input is cleared and
/// re-selected; otherwise it is only re-selected so the user can retry.
/// A rejected write that carries a server alert surfaces that alert.
pub async fn submit<V, F>(view: &mut V, attempt: F) -> SubmitOutcome
where
    V: ChatView + ?Sized,
    F: Future<Output = SubmitOutcome>,
{
    view.set_controls_enabled(false);
    let outcome = attempt.await;

    match &outcome {
        SubmitOutcome::Sent => {
            info!("message sent");
            view.reset_input(true);
        }
        SubmitOutcome::Accepted(id) => {
            info!(id = %id, "message created");
            view.reset_input(true);
        }
        SubmitOutcome::Rejected(reply) => {
            warn!(status = ?reply.text_status, "server did not create the message");
            let alert = reply.alert();
            if let Some(alert) = &alert {
                view.notify(&alert.to_string());
            }
            view.reset_input(false);
            if alert == Some(Alert::Unauthorized) {
                return outcome;
            }
        }
        SubmitOutcome::Failed(e) => {
            warn!(error = %e, "error creating message");
            view.reset_input(false);
        }
    }

    view.set_controls_enabled(true);
    outcome
}
