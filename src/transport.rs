//! HTTP transport with an enforced per-call timeout.
//!
//! A [`Transport`] issues exactly one request. It never fails on a non-2xx
//! status: the status and body come back as a [`RawResponse`] so callers can
//! classify them. Only timeouts and network-level failures surface as
//! [`HuginnError::Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::RETRYABLE_STATUSES;
use crate::{HuginnError, Result};

/// Header carrying the API key. Keeping the key out of the URL keeps it out
/// of access logs and error messages.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP method for a [`HttpRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outbound request.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub api_key: String,
    /// JSON body, sent only for `Post`.
    pub body: Option<serde_json::Value>,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("body", &self.body)
            .finish()
    }
}

/// Status and full body text of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Classification of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success(String),
    RetryableFailure(u16),
    FatalFailure(u16),
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_retryable(&self) -> bool {
        RETRYABLE_STATUSES.contains(&self.status)
    }

    pub fn classify(&self) -> CallOutcome {
        if self.is_success() {
            CallOutcome::Success(self.body.clone())
        } else if self.is_retryable() {
            CallOutcome::RetryableFailure(self.status)
        } else {
            CallOutcome::FatalFailure(self.status)
        }
    }
}

/// Something that can perform one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`, giving up if response headers have not arrived
    /// within `timeout`.
    async fn send(&self, request: &HttpRequest, timeout: Duration) -> Result<RawResponse>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing client (connection pool, proxy settings, ...).
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest, timeout: Duration) -> Result<RawResponse> {
        let builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => {
                let builder = self.http.post(&request.url);
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };
        let builder = builder.header(API_KEY_HEADER, &request.api_key);

        // The timer lives inside the timeout future and is dropped with it,
        // whichever way this returns.
        let response = tokio::time::timeout(timeout, builder.send())
            .await
            .map_err(|_| {
                HuginnError::Transport(format!("no response within {}ms", timeout.as_millis()))
            })?
            .map_err(|e| HuginnError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HuginnError::Transport(e.without_url().to_string()))?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> RawResponse {
        RawResponse {
            status,
            body: "body".into(),
        }
    }

    #[test]
    fn classify_outcomes() {
        assert_eq!(response(200).classify(), CallOutcome::Success("body".into()));
        assert_eq!(response(503).classify(), CallOutcome::RetryableFailure(503));
        assert_eq!(response(429).classify(), CallOutcome::RetryableFailure(429));
        assert_eq!(response(404).classify(), CallOutcome::FatalFailure(404));
        assert_eq!(response(401).classify(), CallOutcome::FatalFailure(401));
    }

    #[test]
    fn debug_redacts_api_key() {
        let request = HttpRequest {
            method: Method::Get,
            url: "https://example.test/v1/models".into(),
            api_key: "AIza-super-secret".into(),
            body: None,
        };
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
