//! WebSocket chat client.
//!
//! ```text
//!  Connecting ──> Open ──> Closed
//! ```
//!
//! [`SocketSession`] holds the session state and reacts to frames; it never
//! touches the network. [`connect`] opens the WebSocket and hands back a
//! sink/stream pair of text frames, and [`run`] drives a session over any
//! such pair until the stream ends.

use chatline_models::{ServerReply, UNAUTHORIZED_STATUS};
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::cookie::CookieJar;
use crate::error::SdkError;
use crate::feed::Feed;
use crate::submit::{compose, submit, SubmitOutcome};
use crate::view::ChatView;

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SocketState {
    /// Handshake in progress; controls disabled.
    Connecting,
    /// Frames flow both ways.
    Open,
    /// Terminal. There is no reconnection.
    Closed,
}

/// One socket session rendered into a [`ChatView`].
pub struct SocketSession<V> {
    state: SocketState,
    authorized: bool,
    feed: Feed,
    view: V,
    jar: CookieJar,
}

impl<V: ChatView> SocketSession<V> {
    /// Start a session in [`SocketState::Connecting`] with controls disabled.
    pub fn new(mut view: V, jar: CookieJar) -> Self {
        view.set_controls_enabled(false);
        view.show_status(&SocketState::Connecting.to_string());
        Self {
            state: SocketState::Connecting,
            authorized: true,
            feed: Feed::new(),
            view,
            jar,
        }
    }

    /// The handshake completed.
    pub fn opened(&mut self) {
        self.transition(SocketState::Open);
        if self.authorized {
            self.view.set_controls_enabled(true);
        }
    }

    /// The connection ended, normally or not.
    pub fn closed(&mut self) {
        if self.state == SocketState::Closed {
            return;
        }
        self.transition(SocketState::Closed);
        self.view.set_controls_enabled(false);
        self.view.notify("connection closed");
    }

    /// The handshake never completed.
    pub fn failed(&mut self, error: &SdkError) {
        warn!(error = %error, "socket connection failed");
        self.transition(SocketState::Closed);
        self.view.set_controls_enabled(false);
        self.view.notify(&format!("could not connect: {error}"));
    }

    fn transition(&mut self, next: SocketState) {
        info!(from = %self.state, to = %next, "socket state changed");
        self.state = next;
        self.view.show_status(&next.to_string());
    }

    /// React to one incoming text frame.
    pub fn handle_frame(&mut self, text: &str) {
        if self.state != SocketState::Open {
            debug!(state = %self.state, "frame ignored");
            return;
        }

        let reply = match ServerReply::from_json(text) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "malformed frame");
                self.view.notify(&format!("malformed frame from server: {e}"));
                return;
            }
        };

        if reply.is_unauthorized() {
            warn!("server refused the session");
            self.authorized = false;
            self.view.notify(UNAUTHORIZED_STATUS);
            self.view.set_controls_enabled(false);
            return;
        }

        if let Some(alert) = reply.alert() {
            warn!(status = %alert, "server reported a failure");
            self.view.notify(&alert.to_string());
        }

        match reply.messages {
            Some(batch) if !batch.is_empty() => {
                self.feed.show(&mut self.view, batch);
            }
            _ => debug!("frame carried no messages"),
        }
    }

    /// Serialise `body` as an outgoing frame, if sending is allowed.
    pub fn outgoing(&self, body: &str) -> Result<String, SdkError> {
        if self.state != SocketState::Open {
            return Err(SdkError::NotConnected);
        }
        if !self.authorized {
            return Err(SdkError::Unauthorized);
        }
        Ok(serde_json::to_string(&compose(body, &self.jar))?)
    }

    /// Submit `body` over `sink`.
    pub async fn send<Si>(&mut self, sink: &mut Si, body: &str) -> SubmitOutcome
    where
        Si: Sink<String, Error = SdkError> + Unpin,
    {
        let frame = match self.outgoing(body) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "message not sent");
                return SubmitOutcome::Failed(e);
            }
        };

        submit(&mut self.view, async move {
            match sink.send(frame).await {
                Ok(()) => SubmitOutcome::Sent,
                Err(e) => SubmitOutcome::Failed(e),
            }
        })
        .await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SocketState {
        self.state
    }

    /// `false` once the server has refused the session.
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Rendered set and cursor.
    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// The view this session renders into.
    pub fn view(&self) -> &V {
        &self.view
    }
}

/// Open the WebSocket at `config.socket_url`, presenting `jar` in the
/// handshake.
pub async fn connect(
    config: &ClientConfig,
    jar: &CookieJar,
) -> Result<
    (
        impl Sink<String, Error = SdkError>,
        impl Stream<Item = Result<String, SdkError>>,
    ),
    SdkError,
> {
    let mut request = config.socket_url.as_str().into_client_request()?;
    if !jar.is_empty() {
        let value = HeaderValue::from_str(&jar.header_value())
            .map_err(|e| SdkError::Config(format!("invalid cookie header: {e}")))?;
        request.headers_mut().insert(COOKIE, value);
    }

    let (ws, response) = tokio_tungstenite::connect_async(request).await?;
    info!(url = %config.socket_url, status = %response.status(), "socket connected");

    let (write, read) = ws.split();
    let sink = write.with(|text: String| future::ready(Ok::<_, SdkError>(Message::Text(text.into()))));
    let stream = read.filter_map(|frame| {
        future::ready(match frame {
            Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
            Ok(_) => None,
            Err(e) => Some(Err(SdkError::from(e))),
        })
    });

    Ok((sink, stream))
}

/// Drive `session` until `stream` ends or fails.
///
/// Texts received on `submissions` are sent as they arrive. The session is
/// opened on entry and closed on exit.
pub async fn run<V, Si, St>(
    session: &mut SocketSession<V>,
    sink: Si,
    stream: St,
    mut submissions: UnboundedReceiver<String>,
) where
    V: ChatView,
    Si: Sink<String, Error = SdkError>,
    St: Stream<Item = Result<String, SdkError>>,
{
    let mut sink = std::pin::pin!(sink);
    let mut stream = std::pin::pin!(stream);

    session.opened();

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(text)) => session.handle_frame(&text),
                Some(Err(e)) => {
                    warn!(error = %e, "socket error");
                    break;
                }
                None => {
                    info!("socket closed by server");
                    break;
                }
            },
            Some(body) = submissions.recv() => {
                session.send(&mut sink, &body).await;
            }
        }
    }

    session.closed();
}
