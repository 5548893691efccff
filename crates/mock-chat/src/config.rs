//! Mock server configuration.

use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8888;
/// How long a long-poll read waits for a new message.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);
/// Messages kept in memory.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Settings shared by every handler.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on. `0` picks a free one.
    pub port: u16,
    /// Long-poll wait before answering `{"messages": []}`.
    pub poll_timeout: Duration,
    /// Older messages are dropped beyond this count.
    pub history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                       | Default | Description            |
    /// |--------------------------------|---------|------------------------|
    /// | `MOCK_CHAT_PORT`               | `8888`  | HTTP listen port       |
    /// | `MOCK_CHAT_POLL_TIMEOUT_SECS`  | `30`    | long-poll wait         |
    /// | `MOCK_CHAT_HISTORY`            | `50`    | messages kept          |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("MOCK_CHAT_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let poll_timeout = std::env::var("MOCK_CHAT_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_timeout);
        let history_limit = std::env::var("MOCK_CHAT_HISTORY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.history_limit);

        Self {
            port,
            poll_timeout,
            history_limit,
        }
    }

    /// Same settings, different port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Same settings, different long-poll wait.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_chat_demo() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8888);
        assert_eq!(cfg.poll_timeout, Duration::from_secs(30));
        assert_eq!(cfg.history_limit, 50);
    }

    #[test]
    fn builders_override_single_fields() {
        let cfg = ServerConfig::default()
            .with_port(0)
            .with_poll_timeout(Duration::from_millis(50));
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.poll_timeout, Duration::from_millis(50));
        assert_eq!(cfg.history_limit, DEFAULT_HISTORY_LIMIT);
    }
}
