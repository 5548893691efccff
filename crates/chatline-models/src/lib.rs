#![deny(missing_docs)]

//! # Chatline Models
//!
//! Wire types shared by the chat clients and the development server.
//!
//! ## Frame hierarchy
//!
//! ```text
//! client -> server
//! ├── OutgoingMessage   { body, _xsrf }          (socket frame / POST form)
//! └── PollRequest       { _xsrf, cursor? }        (GET query string)
//!
//! server -> client
//! └── ServerReply
//!     ├── messages: [ChatMessage]                  (new messages)
//!     ├── error / textStatus                       (failure signals)
//!     └── _id                                      (write acknowledgement)
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`message`] | `MessageId`, `ChatMessage`, `Cursor` |
//! | [`frame`] | `OutgoingMessage`, `PollRequest`, `ServerReply`, `Alert` |
//! | [`error`] | `ModelError` |

pub mod error;
pub mod frame;
pub mod message;

// Re-export all public types at crate root for convenience.
pub use error::*;
pub use frame::*;
pub use message::*;
