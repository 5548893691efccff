//! # Chatline SDK
//!
//! Client side of a small chat service, in two interchangeable variants:
//!
//! * [`socket`]: one long-lived WebSocket; messages go out as JSON frames
//!   and new messages arrive as frames.
//! * [`polling`]: repeated long-poll reads of `GET /message` carrying a
//!   cursor, with exponential backoff on failure; writes go through
//!   `POST /message`.
//!
//! Both variants share the [`Feed`] (de-duplicating renderer and cursor),
//! the [`CookieJar`] (CSRF token source) and the submission routine in
//! [`submit`]. All user-facing effects go through the [`ChatView`] trait so
//! that a terminal UI, a test recorder or anything else can sit behind it.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatline_sdk::{ClientConfig, HttpChannel, Poller, ViewEvent};
//!
//! # async fn run() -> Result<(), chatline_sdk::SdkError> {
//! let config = ClientConfig::from_env();
//! let channel = Arc::new(HttpChannel::bootstrap(&config, config.cookie_jar()).await?);
//!
//! let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<ViewEvent>();
//! let exit = Poller::new(channel, tx, &config).run().await;
//! println!("polling stopped: {exit}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cookie;
pub mod error;
pub mod feed;
pub mod http;
pub mod polling;
pub mod socket;
pub mod submit;
pub mod view;

pub use config::{ClientConfig, MalformedPolicy};
pub use cookie::{cookie, CookieJar};
pub use error::SdkError;
pub use feed::Feed;
pub use http::{ChatHttp, HttpChannel};
pub use polling::{post_message, Backoff, NextStep, PollExit, PollState, Poller};
pub use socket::{SocketSession, SocketState};
pub use submit::SubmitOutcome;
pub use view::{ChatView, ViewEvent};

// Re-export the wire types for ergonomic usage.
pub use chatline_models::{
    Alert, ChatMessage, Cursor, MessageId, OutgoingMessage, PollRequest, ServerReply,
};
