//! HTTP routes of the mock chat server, exercised in-process.

use std::time::Duration;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use chatline_models::{Alert, ServerReply};
use mock_chat::ServerConfig;
use serde_json::json;

const SIGNED_IN: &str = "user=ada; _xsrf=tok";

fn server() -> TestServer {
    let config = ServerConfig::default().with_poll_timeout(Duration::from_millis(100));
    TestServer::new(mock_chat::router(config)).unwrap()
}

async fn post(server: &TestServer, body: &str) -> ServerReply {
    server
        .post("/message")
        .add_header(COOKIE, HeaderValue::from_static(SIGNED_IN))
        .form(&json!({ "body": body, "_xsrf": "tok" }))
        .await
        .json::<ServerReply>()
}

#[tokio::test]
async fn index_issues_xsrf_cookie_once() {
    let server = server();

    let res = server.get("/").await;
    res.assert_status_ok();
    let set_cookie = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("_xsrf="), "{set_cookie}");

    let res = server
        .get("/")
        .add_header(COOKIE, HeaderValue::from_static("_xsrf=already"))
        .await;
    assert!(res.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn login_sets_user_cookie() {
    let server = server();

    let res = server.get("/login").add_query_param("name", "ada").await;
    res.assert_status_ok();
    let set_cookie = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("user=ada"), "{set_cookie}");

    let res = server.get("/login").add_query_param("name", "a;b").await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn read_without_session_is_unauthorized() {
    let reply = server().get("/message").await.json::<ServerReply>();
    assert!(reply.error);
    assert_eq!(reply.alert(), Some(Alert::Unauthorized));
}

#[tokio::test]
async fn write_without_matching_token_is_forbidden() {
    let server = server();
    let res = server
        .post("/message")
        .add_header(COOKIE, HeaderValue::from_static(SIGNED_IN))
        .form(&json!({ "body": "hi", "_xsrf": "other" }))
        .await;
    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn write_without_body_is_bad_input() {
    let server = server();
    let reply = server
        .post("/message")
        .add_header(COOKIE, HeaderValue::from_static(SIGNED_IN))
        .form(&json!({ "_xsrf": "tok" }))
        .await
        .json::<ServerReply>();
    assert!(matches!(reply.alert(), Some(Alert::Failure(status)) if status.starts_with("Bad input data")));
}

#[tokio::test]
async fn write_is_acknowledged_and_read_back() {
    let server = server();

    let ack = post(&server, "hello").await;
    assert_eq!(ack.accepted_id().map(|id| id.as_str()), Some("1"));
    assert_eq!(ack.from.as_deref(), Some("ada"));
    assert_eq!(ack.body.as_deref(), Some("hello"));
    post(&server, "again").await;

    let reply = server
        .get("/message")
        .add_header(COOKIE, HeaderValue::from_static(SIGNED_IN))
        .await
        .json::<ServerReply>();
    let bodies: Vec<_> = reply.messages.unwrap().into_iter().map(|m| m.body).collect();
    assert_eq!(bodies, vec!["hello", "again"]);

    let reply = server
        .get("/message")
        .add_header(COOKIE, HeaderValue::from_static(SIGNED_IN))
        .add_query_param("cursor", "1")
        .await
        .json::<ServerReply>();
    assert_eq!(reply.messages.unwrap().len(), 1);
}

#[tokio::test]
async fn idle_read_times_out_with_empty_batch() {
    let server = server();
    post(&server, "hello").await;

    let reply = server
        .get("/message")
        .add_header(COOKIE, HeaderValue::from_static(SIGNED_IN))
        .add_query_param("cursor", "1")
        .await
        .json::<ServerReply>();
    assert_eq!(reply.messages, Some(Vec::new()));
}

#[tokio::test]
async fn waiting_read_is_woken_by_a_write() {
    let config = ServerConfig::default().with_poll_timeout(Duration::from_secs(5));
    let server = TestServer::new(mock_chat::router(config)).unwrap();

    let read = async {
        server
            .get("/message")
            .add_header(COOKIE, HeaderValue::from_static(SIGNED_IN))
            .await
            .json::<ServerReply>()
    };
    let write = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        post(&server, "wake up").await
    };

    let (reply, ack) = tokio::join!(read, write);
    let messages = reply.messages.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(Some(&messages[0].id), ack.accepted_id());
}
