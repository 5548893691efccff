//! Both client variants against a live `mock-chat` server.

use std::sync::Arc;
use std::time::Duration;

use chatline_sdk::{
    polling, socket, ClientConfig, HttpChannel, NextStep, PollExit, Poller, SocketSession,
    SocketState, SubmitOutcome, ViewEvent,
};
use mock_chat::ServerConfig;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> ClientConfig {
    let server = ServerConfig::default()
        .with_port(0)
        .with_poll_timeout(Duration::from_millis(200));
    let addr = mock_chat::spawn(server).await.unwrap();
    ClientConfig::new(&format!("http://{addr}"))
}

async fn signed_in_channel(config: &mut ClientConfig) -> HttpChannel {
    config.cookie = "user=ada".to_string();
    HttpChannel::bootstrap(config, config.cookie_jar()).await.unwrap()
}

async fn next_matching(
    rx: &mut UnboundedReceiver<ViewEvent>,
    wanted: impl Fn(&ViewEvent) -> bool,
) -> ViewEvent {
    timeout(WAIT, async {
        loop {
            let event = rx.recv().await.expect("view channel closed");
            if wanted(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for view event")
}

#[tokio::test]
async fn bootstrap_obtains_csrf_cookie() {
    let mut config = start_server().await;
    let channel = signed_in_channel(&mut config).await;

    assert!(channel.jar().csrf_token().is_some());
    assert_eq!(channel.jar().get("user").as_deref(), Some("ada"));
}

#[tokio::test]
async fn polling_client_posts_and_reads_back() {
    let mut config = start_server().await;
    let http = Arc::new(signed_in_channel(&mut config).await);

    let mut writer_view: Vec<ViewEvent> = Vec::new();
    let outcome = polling::post_message(http.as_ref(), &mut writer_view, "hello").await;
    assert!(matches!(outcome, SubmitOutcome::Accepted(_)), "{outcome:?}");
    assert!(writer_view.contains(&ViewEvent::InputReset { clear: true }));

    let mut poller = Poller::new(http.clone(), Vec::<ViewEvent>::new(), &config);
    assert_eq!(poller.poll_once().await, NextStep::Immediately);

    let bodies: Vec<_> = poller
        .view()
        .iter()
        .filter_map(|e| match e {
            ViewEvent::Appended(m) => Some(m.body.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(bodies, vec!["hello"]);

    // Cursor now at the newest message: the next read waits, then comes back empty.
    assert_eq!(poller.poll_once().await, NextStep::Immediately);
    assert_eq!(poller.state().feed().len(), 1);
    assert_eq!(
        poller.state().feed().cursor().position().map(|c| c.as_str()),
        Some("1")
    );
}

#[tokio::test]
async fn polling_client_stops_when_unauthorized() {
    let config = start_server().await;
    let http = Arc::new(HttpChannel::bootstrap(&config, config.cookie_jar()).await.unwrap());

    let mut poller = Poller::new(http, Vec::<ViewEvent>::new(), &config);
    let exit = timeout(WAIT, poller.run()).await.unwrap();

    assert_eq!(exit, PollExit::Unauthorized);
    assert!(poller
        .view()
        .contains(&ViewEvent::Notified("unauthorized".into())));
}

#[tokio::test]
async fn socket_client_round_trip() {
    let mut config = start_server().await;
    let jar = signed_in_channel(&mut config).await.jar().clone();

    let (view_tx, mut view_rx) = unbounded_channel::<ViewEvent>();
    let (submit_tx, submit_rx) = unbounded_channel::<String>();
    let (sink, stream) = socket::connect(&config, &jar).await.unwrap();

    tokio::spawn(async move {
        let mut session = SocketSession::new(view_tx, jar);
        socket::run(&mut session, sink, stream, submit_rx).await;
    });

    next_matching(&mut view_rx, |e| *e == ViewEvent::ControlsEnabled(true)).await;
    submit_tx.send("over the socket".to_string()).unwrap();

    let appended = next_matching(&mut view_rx, |e| matches!(e, ViewEvent::Appended(_))).await;
    let ViewEvent::Appended(message) = appended else {
        unreachable!()
    };
    assert_eq!(message.body, "over the socket");
    assert_eq!(message.from, "ada");
}

#[tokio::test]
async fn socket_client_blocks_when_unauthorized() {
    let config = start_server().await;
    let jar = config.cookie_jar();

    let (sink, stream) = socket::connect(&config, &jar).await.unwrap();
    let (_submit_tx, submit_rx) = unbounded_channel::<String>();
    let mut session = SocketSession::new(Vec::<ViewEvent>::new(), jar);

    timeout(WAIT, socket::run(&mut session, sink, stream, submit_rx))
        .await
        .unwrap();

    assert!(!session.is_authorized());
    assert_eq!(session.state(), SocketState::Closed);
    assert!(session
        .view()
        .contains(&ViewEvent::Notified("unauthorized".into())));
    assert!(session.outgoing("hi").is_err());
}
