//! `GET /socket`: WebSocket variant of the chat.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use chatline_models::{OutgoingMessage, ServerReply};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::routes::request_cookie;
use crate::{AppState, USER_COOKIE};

pub(crate) async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let user = request_cookie(&headers, USER_COOKIE);
    ws.on_upgrade(move |socket| session(socket, state, user))
}

/// One connected client.
///
/// Every `{"body": …}` frame is stored, acknowledged to its sender with the
/// stored message, and broadcast to all sockets (the sender included) as
/// `{"messages": [msg]}`.
async fn session(socket: WebSocket, state: Arc<AppState>, user: Option<String>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(user) = user else {
        warn!("socket opened without a session");
        let _ = send_reply(&mut sender, &ServerReply::unauthorized()).await;
        return;
    };

    info!(user = %user, "socket opened");
    let mut updates = state.updates.subscribe();

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = match serde_json::from_str::<OutgoingMessage>(text.as_str()) {
                        Ok(outgoing) => ServerReply::ack(&state.publish(&user, &outgoing.body).await),
                        Err(e) => ServerReply::failure(format!("Bad input data ... {e}")),
                    };
                    if send_reply(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(user = %user, error = %e, "socket error");
                    break;
                }
            },
            update = updates.recv() => match update {
                Ok(message) => {
                    if send_reply(&mut sender, &ServerReply::batch(vec![message])).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(user = %user, skipped, "socket fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(user = %user, "socket closed");
}

async fn send_reply(
    sender: &mut SplitSink<WebSocket, Message>,
    reply: &ServerReply,
) -> Result<(), axum::Error> {
    match serde_json::to_string(reply) {
        Ok(text) => sender.send(Message::Text(text.into())).await,
        Err(e) => {
            error!(error = %e, "reply not serialisable");
            Ok(())
        }
    }
}
