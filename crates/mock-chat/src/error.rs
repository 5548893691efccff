//! Error types for the mock chat server.
//!
//! [`ChatError`] implements [`axum::response::IntoResponse`] so handlers can
//! return `Result<…, ChatError>` directly. Most failures are answered the
//! way the chat demo does: HTTP 200 with `{"error": 1, "textStatus": …}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chatline_models::ServerReply;

/// Ways a chat request can fail.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No `user` cookie on the request.
    #[error("unauthorized")]
    Unauthorized,

    /// The `_xsrf` argument does not match the `_xsrf` cookie.
    #[error("'_xsrf' argument missing or does not match cookie")]
    XsrfMismatch,

    /// The request body could not be decoded.
    #[error("Bad input data: {0}")]
    BadInput(String),

    /// A login name that cannot be stored in a cookie.
    #[error("invalid user name: {0}")]
    InvalidName(String),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request refused");
        match self {
            Self::Unauthorized => Json(ServerReply::unauthorized()).into_response(),
            Self::BadInput(_) => Json(ServerReply::failure(self.to_string())).into_response(),
            Self::XsrfMismatch => (StatusCode::FORBIDDEN, self.to_string()).into_response(),
            Self::InvalidName(_) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
        }
    }
}
