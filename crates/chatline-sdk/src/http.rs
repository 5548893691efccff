//! HTTP side of the chat protocol.
//!
//! [`ChatHttp`] is the seam the polling client is written against;
//! [`HttpChannel`] implements it with `reqwest`.
//!
//! | Call | Request | Success reply |
//! |------|---------|---------------|
//! | read  | `GET /message?_xsrf=…&cursor=…` | `{ "messages": [...] }` |
//! | write | `POST /message` (form `body`, `_xsrf`) | `{ "_id": … }` |

use std::future::Future;

use chatline_models::{OutgoingMessage, PollRequest, ServerReply};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::RequestBuilder;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::cookie::CookieJar;
use crate::error::SdkError;

/// Request/response channel to the chat server.
pub trait ChatHttp: Send + Sync {
    /// Long-poll read of messages newer than `request.cursor`.
    fn fetch(
        &self,
        request: &PollRequest,
    ) -> impl Future<Output = Result<ServerReply, SdkError>> + Send;

    /// Store a new message.
    fn post(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<ServerReply, SdkError>> + Send;

    /// Cookies presented with every request.
    fn cookie_jar(&self) -> &CookieJar;
}

/// `reqwest`-backed [`ChatHttp`].
///
/// Every request carries the cookie jar as a `Cookie` header and is bounded
/// by the configured timeout. Non-success statuses and bodies that are not
/// a JSON reply are reported as errors.
#[derive(Debug, Clone)]
pub struct HttpChannel {
    http: reqwest::Client,
    root_url: String,
    message_url: String,
    jar: CookieJar,
}

impl HttpChannel {
    /// Build a channel without touching the network.
    pub fn new(config: &ClientConfig, jar: CookieJar) -> Result<Self, SdkError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            root_url: config.url("/"),
            message_url: config.url("/message"),
            jar,
        })
    }

    /// Build a channel and make sure it holds an anti-forgery token.
    ///
    /// When `jar` has none, the server root is fetched once and its
    /// `Set-Cookie` headers are merged. Failing to obtain a token is logged,
    /// not fatal: writes then go out without one.
    pub async fn bootstrap(config: &ClientConfig, jar: CookieJar) -> Result<Self, SdkError> {
        let mut channel = Self::new(config, jar)?;
        if channel.jar.csrf_token().is_none() {
            match channel.fetch_csrf_cookie().await {
                Ok(true) => info!(url = %channel.root_url, "anti-forgery cookie obtained"),
                Ok(false) => warn!(url = %channel.root_url, "server issued no anti-forgery cookie"),
                Err(e) => warn!(error = %e, "could not fetch anti-forgery cookie"),
            }
        }
        Ok(channel)
    }

    /// `GET /` and absorb every `Set-Cookie`. Returns whether a token is now
    /// present.
    pub async fn fetch_csrf_cookie(&mut self) -> Result<bool, SdkError> {
        let res = self.with_cookies(self.http.get(&self.root_url)).send().await?;
        for value in res.headers().get_all(SET_COOKIE) {
            if let Ok(text) = value.to_str() {
                if let Some(name) = self.jar.absorb_set_cookie(text) {
                    debug!(cookie = %name, "cookie stored");
                }
            }
        }
        Ok(self.jar.csrf_token().is_some())
    }

    /// The cookies this channel presents.
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    fn with_cookies(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.jar.is_empty() {
            builder
        } else {
            builder.header(COOKIE, self.jar.header_value())
        }
    }

    async fn decode(res: reqwest::Response) -> Result<ServerReply, SdkError> {
        let res = res.error_for_status()?;
        let bytes = res.bytes().await?;
        Ok(ServerReply::from_slice(&bytes)?)
    }
}

impl ChatHttp for HttpChannel {
    async fn fetch(&self, request: &PollRequest) -> Result<ServerReply, SdkError> {
        let res = self
            .with_cookies(self.http.get(&self.message_url))
            .query(request)
            .send()
            .await?;
        Self::decode(res).await
    }

    async fn post(&self, message: &OutgoingMessage) -> Result<ServerReply, SdkError> {
        let res = self
            .with_cookies(self.http.post(&self.message_url))
            .form(message)
            .send()
            .await?;
        Self::decode(res).await
    }

    fn cookie_jar(&self) -> &CookieJar {
        &self.jar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_derived_from_config() {
        let cfg = ClientConfig::new("http://chat.local:8888");
        let channel = HttpChannel::new(&cfg, CookieJar::default()).unwrap();
        assert_eq!(channel.root_url, "http://chat.local:8888/");
        assert_eq!(channel.message_url, "http://chat.local:8888/message");
    }

    #[test]
    fn jar_is_kept() {
        let cfg = ClientConfig::default();
        let jar = CookieJar::parse("_xsrf=tok", "_xsrf");
        let channel = HttpChannel::new(&cfg, jar.clone()).unwrap();
        assert_eq!(channel.cookie_jar(), &jar);
    }
}
