//! Client configuration.
//!
//! Built from environment variables by [`ClientConfig::from_env`]; the CLI
//! overrides individual fields from its flags.

use std::time::Duration;

use crate::cookie::CookieJar;

/// Default HTTP base URL of the chat server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8888";
/// Default name of the anti-forgery cookie.
pub const DEFAULT_CSRF_COOKIE: &str = "_xsrf";
/// Per-request transport timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Retry delay the polling loop starts from and resets to after a success.
pub const ERROR_SLEEP_FLOOR: Duration = Duration::from_millis(500);

/// What the polling loop does with a successful read that has no
/// `messages` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MalformedPolicy {
    /// Count it as a failure: double the delay and try again.
    #[default]
    Backoff,
    /// Stop polling for good.
    Halt,
}

/// Everything a client needs to reach the chat server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP base URL, without trailing slash (e.g. `http://127.0.0.1:8888`).
    pub base_url: String,
    /// WebSocket endpoint (e.g. `ws://127.0.0.1:8888/socket`).
    pub socket_url: String,
    /// Cookie string presented to the server (`user=…; _xsrf=…`).
    pub cookie: String,
    /// Name of the cookie holding the anti-forgery token.
    pub csrf_cookie: String,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Floor of the polling retry delay.
    pub error_sleep_floor: Duration,
    /// Handling of read replies without a message list.
    pub on_malformed: MalformedPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    /// Configuration for the server at `base_url`, everything else default.
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            socket_url: socket_url_for(&base_url),
            base_url,
            cookie: String::new(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            error_sleep_floor: ERROR_SLEEP_FLOOR,
            on_malformed: MalformedPolicy::default(),
        }
    }

    /// Build the configuration from environment variables.
    ///
    /// | Variable            | Default                 | Description                    |
    /// |---------------------|-------------------------|--------------------------------|
    /// | `CHAT_URL`          | `http://127.0.0.1:8888` | HTTP base URL                  |
    /// | `CHAT_SOCKET_URL`   | `ws://…/socket`         | WebSocket endpoint             |
    /// | `CHAT_COOKIE`       | *(empty)*               | Initial cookie string          |
    /// | `CHAT_XSRF_COOKIE`  | `_xsrf`                 | Anti-forgery cookie name       |
    /// | `CHAT_TIMEOUT_SECS` | `60`                    | Per-request timeout in seconds |
    pub fn from_env() -> Self {
        let base_url = std::env::var("CHAT_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url);

        if let Ok(url) = std::env::var("CHAT_SOCKET_URL") {
            config.socket_url = url;
        }
        if let Ok(cookie) = std::env::var("CHAT_COOKIE") {
            config.cookie = cookie;
        }
        if let Ok(name) = std::env::var("CHAT_XSRF_COOKIE") {
            config.csrf_cookie = name;
        }
        if let Some(secs) = std::env::var("CHAT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Point the configuration at another server, re-deriving the socket URL.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.socket_url = socket_url_for(&self.base_url);
        self
    }

    /// A cookie jar seeded from [`cookie`](Self::cookie).
    pub fn cookie_jar(&self) -> CookieJar {
        CookieJar::parse(&self.cookie, &self.csrf_cookie)
    }

    /// Absolute URL of a server path (`path` starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Derive the WebSocket endpoint from an HTTP base URL.
fn socket_url_for(base_url: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!("{ws_base}/socket")
}
