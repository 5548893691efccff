//! In-memory chat server speaking the same protocol as the production
//! chat service, for local development and integration tests.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/`        | GET  | issues the `_xsrf` cookie |
//! | `/login`   | GET  | `?name=…` sets the `user` cookie |
//! | `/logout`  | GET  | clears the `user` cookie |
//! | `/message` | GET  | long-poll read after `cursor` |
//! | `/message` | POST | form `body`, `_xsrf`; stores a message |
//! | `/socket`  | GET  | WebSocket variant |
//!
//! Sessions are not signed: whatever the `user` cookie says is the sender's
//! name.

pub mod config;
pub mod error;
pub mod store;

mod routes;
mod socket;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use chatline_models::ChatMessage;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

pub use config::ServerConfig;
pub use error::ChatError;
pub use store::ChatStore;

/// Cookie holding the signed-in user's name.
pub const USER_COOKIE: &str = "user";
/// Cookie holding the anti-forgery token.
pub const XSRF_COOKIE: &str = "_xsrf";

/// State shared across all handlers.
pub struct AppState {
    store: Mutex<ChatStore>,
    updates: broadcast::Sender<ChatMessage>,
    config: ServerConfig,
}

impl AppState {
    /// Empty conversation.
    pub fn new(config: ServerConfig) -> Self {
        let (updates, _) = broadcast::channel(config.history_limit.max(1));
        Self {
            store: Mutex::new(ChatStore::new(config.history_limit)),
            updates,
            config,
        }
    }

    /// Store a message and hand it to every waiter and socket.
    pub async fn publish(&self, from: &str, body: &str) -> ChatMessage {
        let mut store = self.store.lock().await;
        let message = store.push(from, body);
        let listeners = self.updates.send(message.clone()).unwrap_or(0);
        info!(id = %message.id, from, listeners, "message stored");
        message
    }
}

/// All routes over a fresh, empty conversation.
pub fn router(config: ServerConfig) -> Router {
    with_state(Arc::new(AppState::new(config)))
}

/// All routes over existing state.
pub fn with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/login", get(routes::login))
        .route("/logout", get(routes::logout))
        .route(
            "/message",
            get(routes::read_messages).post(routes::post_message),
        )
        .route("/socket", get(socket::upgrade))
        .with_state(state)
}

/// Serve on `listener` until the process exits.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> std::io::Result<()> {
    axum::serve(listener, router(config)).await
}

/// Start a server on `127.0.0.1` in the background and return its address.
///
/// Use port `0` in tests to get a free port.
pub async fn spawn(config: ServerConfig) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(("127.0.0.1", config.port)).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = serve(listener, config).await {
            error!(error = %e, "mock chat server stopped");
        }
    });

    info!(address = %addr, "mock chat server listening");
    Ok(addr)
}
