//! Long-polling client.
//!
//! One read is in flight at a time. A read that returns messages is
//! rendered and immediately followed by the next one; a failed read doubles
//! the retry delay before trying again. The delay falls back to its floor
//! after any successful read.
//!
//! ```text
//!            ┌──────────── messages: render, reset delay ────────────┐
//!            v                                                       │
//!  Idle ──> RequestInFlight ──> Success ─────────────────────────────┘
//!            ^        │
//!            │        └──> Failure: delay *= 2, sleep ───┐
//!            └───────────────────────────────────────────┘
//! ```
//!
//! The loop state lives in [`PollState`], which is pure and can be driven
//! without a network; [`Poller`] couples it to a [`ChatHttp`] channel and a
//! [`ChatView`].

use std::sync::Arc;
use std::time::Duration;

use chatline_models::{MessageId, PollRequest, ServerReply, UNAUTHORIZED_STATUS};
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, MalformedPolicy};
use crate::error::SdkError;
use crate::feed::Feed;
use crate::http::ChatHttp;
use crate::submit::{compose, submit, SubmitOutcome};
use crate::view::ChatView;

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Retry delay that doubles on every failure and has no ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    floor: Duration,
    current: Duration,
}

impl Backoff {
    /// Start at `floor`.
    pub fn new(floor: Duration) -> Self {
        Self {
            floor,
            current: floor,
        }
    }

    /// The delay as it stands.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Record a failure and return the delay to sleep before retrying.
    pub fn fail(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2);
        self.current
    }

    /// Back to the floor.
    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}

// ---------------------------------------------------------------------------
// Loop state
// ---------------------------------------------------------------------------

/// Why the polling loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PollExit {
    /// The server refused the session.
    #[strum(serialize = "unauthorized")]
    Unauthorized,
    /// A successful read had no message list and the policy is to halt.
    #[strum(serialize = "malformed reply")]
    MalformedReply,
}

/// What the loop does after a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Issue the next read right away.
    Immediately,
    /// Sleep, then issue the next read.
    After(Duration),
    /// Do not read again.
    Stop(PollExit),
}

/// Cursor, rendered set and retry delay of one polling loop.
#[derive(Debug, Clone)]
pub struct PollState {
    feed: Feed,
    backoff: Backoff,
    policy: MalformedPolicy,
}

impl PollState {
    /// Fresh state: no cursor, delay at `floor`.
    pub fn new(floor: Duration, policy: MalformedPolicy) -> Self {
        Self {
            feed: Feed::new(),
            backoff: Backoff::new(floor),
            policy,
        }
    }

    /// Query for the next read. The cursor is omitted until the first batch.
    pub fn request(&self, csrf_token: Option<String>) -> PollRequest {
        PollRequest {
            csrf_token,
            cursor: self.feed.cursor().position().cloned(),
        }
    }

    /// Handle a reply that arrived intact.
    pub fn on_reply<V: ChatView + ?Sized>(&mut self, view: &mut V, reply: ServerReply) -> NextStep {
        if reply.is_unauthorized() {
            warn!("server refused the session; polling stopped");
            view.notify(UNAUTHORIZED_STATUS);
            view.set_controls_enabled(false);
            return NextStep::Stop(PollExit::Unauthorized);
        }

        match reply.messages {
            Some(batch) => {
                debug!(count = batch.len(), "received new messages");
                self.feed.show(view, batch);
                self.backoff.reset();
                NextStep::Immediately
            }
            None => match self.policy {
                MalformedPolicy::Halt => {
                    error!(status = ?reply.text_status, "error receiving new messages; polling stopped");
                    NextStep::Stop(PollExit::MalformedReply)
                }
                MalformedPolicy::Backoff => {
                    let delay = self.backoff.fail();
                    warn!(
                        status = ?reply.text_status,
                        delay = ?delay,
                        "reply without messages; retrying"
                    );
                    NextStep::After(delay)
                }
            },
        }
    }

    /// Handle a read that failed in transport.
    pub fn on_failure(&mut self, error: &SdkError) -> NextStep {
        let delay = self.backoff.fail();
        warn!(error = %error, delay = ?delay, "poll error; sleeping");
        NextStep::After(delay)
    }

    /// Feed (rendered set and cursor).
    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Retry delay.
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// A polling loop bound to a channel and a view.
pub struct Poller<H, V> {
    http: Arc<H>,
    view: V,
    state: PollState,
}

impl<H: ChatHttp, V: ChatView> Poller<H, V> {
    /// Create the loop; nothing is requested until [`run`](Self::run) or
    /// [`poll_once`](Self::poll_once).
    pub fn new(http: Arc<H>, view: V, config: &ClientConfig) -> Self {
        Self {
            http,
            view,
            state: PollState::new(config.error_sleep_floor, config.on_malformed),
        }
    }

    /// One read cycle.
    pub async fn poll_once(&mut self) -> NextStep {
        let request = self.state.request(self.http.cookie_jar().csrf_token());
        debug!(cursor = ?request.cursor.as_ref().map(MessageId::as_str), "polling");

        match self.http.fetch(&request).await {
            Ok(reply) => self.state.on_reply(&mut self.view, reply),
            Err(e) => self.state.on_failure(&e),
        }
    }

    /// Poll until the loop decides to stop.
    pub async fn run(&mut self) -> PollExit {
        info!("polling started");
        self.view.set_controls_enabled(true);
        self.view.show_status("polling");

        loop {
            match self.poll_once().await {
                NextStep::Immediately => tokio::task::yield_now().await,
                NextStep::After(delay) => tokio::time::sleep(delay).await,
                NextStep::Stop(exit) => {
                    info!(reason = %exit, "polling stopped");
                    self.view.show_status(&format!("stopped: {exit}"));
                    return exit;
                }
            }
        }
    }

    /// Loop state.
    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// The view this loop renders into.
    pub fn view(&self) -> &V {
        &self.view
    }
}

/// Submit `text` through `POST /message`.
///
/// See [`submit`] for the control choreography; the outcome is decided by
/// the presence of an id in the reply.
pub async fn post_message<H, V>(http: &H, view: &mut V, text: &str) -> SubmitOutcome
where
    H: ChatHttp,
    V: ChatView + ?Sized,
{
    let message = compose(text, http.cookie_jar());
    submit(view, async move {
        match http.post(&message).await {
            Ok(reply) => SubmitOutcome::from_reply(reply),
            Err(e) => SubmitOutcome::Failed(e),
        }
    })
    .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
