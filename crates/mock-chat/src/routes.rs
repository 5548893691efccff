//! HTTP handlers: session cookies and the long-poll message endpoint.

use std::sync::Arc;

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chatline_models::{OutgoingMessage, PollRequest, ServerReply};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ChatError;
use crate::{AppState, USER_COOKIE, XSRF_COOKIE};

/// Value of cookie `name` on the request, if non-empty.
pub(crate) fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `GET /`: issue the anti-forgery cookie when the client has none.
pub(crate) async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let held = state.store.lock().await.len();
    let body = match request_cookie(&headers, USER_COOKIE) {
        Some(user) => format!("signed in as {user}; {held} messages\n"),
        None => "not signed in; visit /login?name=<you>\n".to_string(),
    };

    let mut response = body.into_response();
    if request_cookie(&headers, XSRF_COOKIE).is_none() {
        let token = Uuid::new_v4().simple().to_string();
        if let Ok(value) = HeaderValue::from_str(&format!("{XSRF_COOKIE}={token}; Path=/")) {
            debug!("anti-forgery cookie issued");
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

#[derive(Deserialize)]
pub(crate) struct LoginParams {
    name: String,
}

/// `GET /login?name=…`: development sign-in, stores the name in `user`.
pub(crate) async fn login(Query(params): Query<LoginParams>) -> Result<Response, ChatError> {
    let valid = !params.name.is_empty()
        && params
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ChatError::InvalidName(params.name));
    }

    let value = HeaderValue::from_str(&format!("{USER_COOKIE}={}; Path=/", params.name))
        .map_err(|_| ChatError::InvalidName(params.name.clone()))?;
    info!(user = %params.name, "signed in");
    Ok(([(SET_COOKIE, value)], format!("signed in as {}\n", params.name)).into_response())
}

/// `GET /logout`
pub(crate) async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, HeaderValue::from_static("user=; Max-Age=0; Path=/"))],
        "signed out\n",
    )
}

/// `GET /message`: long-poll read.
///
/// Answers at once when messages newer than the cursor are held (the whole
/// history for a first read); otherwise waits for the next post or for the
/// poll timeout, whichever comes first.
pub(crate) async fn read_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<PollRequest>, QueryRejection>,
) -> Result<Json<ServerReply>, ChatError> {
    let user = request_cookie(&headers, USER_COOKIE).ok_or(ChatError::Unauthorized)?;
    let Query(request) = query.map_err(|e| ChatError::BadInput(e.body_text()))?;

    // Subscribe while holding the store so no post can slip in between.
    let mut updates = {
        let store = state.store.lock().await;
        let pending = store.since(request.cursor.as_ref());
        if !pending.is_empty() {
            debug!(user = %user, count = pending.len(), "answering from history");
            return Ok(Json(ServerReply::batch(pending)));
        }
        state.updates.subscribe()
    };

    debug!(user = %user, "waiter added");
    let reply = match tokio::time::timeout(state.config.poll_timeout, updates.recv()).await {
        Ok(Ok(message)) => ServerReply::batch(vec![message]),
        Ok(Err(RecvError::Lagged(_))) => {
            let store = state.store.lock().await;
            ServerReply::batch(store.since(request.cursor.as_ref()))
        }
        Ok(Err(RecvError::Closed)) | Err(_) => ServerReply::batch(Vec::new()),
    };
    debug!(user = %user, "waiter removed");
    Ok(Json(reply))
}

/// `POST /message`: store a message and wake every waiter.
pub(crate) async fn post_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<OutgoingMessage>, FormRejection>,
) -> Result<Json<ServerReply>, ChatError> {
    let Form(outgoing) = form.map_err(|e| ChatError::BadInput(e.body_text()))?;

    let expected = request_cookie(&headers, XSRF_COOKIE);
    if expected.is_none() || outgoing.csrf_token != expected {
        return Err(ChatError::XsrfMismatch);
    }

    let user = request_cookie(&headers, USER_COOKIE).ok_or(ChatError::Unauthorized)?;
    let message = state.publish(&user, &outgoing.body).await;
    Ok(Json(ServerReply::ack(&message)))
}
