//! Gemini REST endpoints: catalog listing and content generation.
//!
//! See: <https://ai.google.dev/api/models> and
//! <https://ai.google.dev/api/generate-content>

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::retry::{RetryPolicy, with_retry};
use crate::transport::{HttpRequest, HttpTransport, Method, RawResponse, Transport};
use crate::{HuginnError, Result};

/// Default base URL for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Longest slice of an unparsable error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Endpoint namespace of the Generative Language API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// `v1`, tried first.
    V1,
    /// `v1beta`, tried when `v1` has nothing that works.
    V1Beta,
}

impl ApiVersion {
    /// All versions in preference order.
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1, ApiVersion::V1Beta];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V1Beta => "v1beta",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    /// Single-turn request with the prompt as the only user part.
    fn single_turn(prompt: &'a str) -> Self {
        Self {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    /// Canonical code such as `NOT_FOUND` or `PERMISSION_DENIED`.
    #[serde(default)]
    status: Option<String>,
}

/// Concatenated text of the first candidate, trimmed. `None` when the
/// response carries no text at all.
fn extract_text(body: &str) -> Result<Option<String>> {
    let response: GenerateContentResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Turn a non-2xx response into [`HuginnError::Api`], keeping the upstream
/// status code (e.g. `NOT_FOUND`) in the message.
pub(crate) fn api_error(response: &RawResponse) -> HuginnError {
    let message = match serde_json::from_str::<ErrorEnvelope>(&response.body) {
        Ok(ErrorEnvelope { error }) => match (error.status, error.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code,
            (None, Some(message)) => message,
            (None, None) => format!("HTTP {}", response.status),
        },
        Err(_) => {
            let body = response.body.trim();
            if body.is_empty() {
                format!("HTTP {}", response.status)
            } else {
                body.chars().take(MAX_ERROR_BODY_CHARS).collect()
            }
        }
    };
    HuginnError::Api {
        status: response.status,
        message,
    }
}

// ============================================================================
// Client
// ============================================================================

/// Thin client over the two Gemini endpoints Huginn needs.
///
/// Every call goes through [`with_retry()`] with the caller's policy; the
/// client itself holds no per-request state.
#[derive(Clone)]
pub struct GeminiApi {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl Default for GeminiApi {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiApi {
    /// Client for the public endpoint over a fresh HTTP transport.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new()), base_url)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_models_url(&self, version: ApiVersion) -> String {
        format!("{}/{}/models", self.base_url, version)
    }

    fn generate_content_url(&self, version: ApiVersion, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, version, model
        )
    }

    /// Fetch the model catalog for one API version.
    pub async fn list_models(
        &self,
        api_key: &str,
        version: ApiVersion,
        policy: &RetryPolicy,
    ) -> Result<Catalog> {
        let request = HttpRequest {
            method: Method::Get,
            url: self.list_models_url(version),
            api_key: api_key.to_string(),
            body: None,
        };
        let response = with_retry(policy, "list_models", || {
            self.transport.send(&request, policy.timeout)
        })
        .await?;

        if !response.is_success() {
            return Err(api_error(&response));
        }
        let catalog = Catalog::parse(&response.body)?;
        debug!(%version, models = catalog.models().len(), "listed models");
        Ok(catalog)
    }

    /// Generate text from `prompt` with one specific version and model.
    ///
    /// `model` must be a bare name (no `models/` prefix). A 2xx answer
    /// without text is an [`HuginnError::EmptyResponse`].
    pub async fn generate_content(
        &self,
        api_key: &str,
        version: ApiVersion,
        model: &str,
        prompt: &str,
        policy: &RetryPolicy,
    ) -> Result<String> {
        let body = serde_json::to_value(GenerateContentRequest::single_turn(prompt))?;
        let request = HttpRequest {
            method: Method::Post,
            url: self.generate_content_url(version, model),
            api_key: api_key.to_string(),
            body: Some(body),
        };
        let response = with_retry(policy, "generate_content", || {
            self.transport.send(&request, policy.timeout)
        })
        .await?;

        if !response.is_success() {
            return Err(api_error(&response));
        }
        extract_text(&response.body)?.ok_or_else(|| HuginnError::EmptyResponse {
            model: model.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(GenerateContentRequest::single_turn("hello")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })
        );
    }

    #[test]
    fn urls_use_bare_version_and_model() {
        let api = GeminiApi::with_base_url("http://localhost:1234/");
        assert_eq!(
            api.list_models_url(ApiVersion::V1Beta),
            "http://localhost:1234/v1beta/models"
        );
        assert_eq!(
            api.generate_content_url(ApiVersion::V1, "gemini-2.0-flash"),
            "http://localhost:1234/v1/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn extract_text_joins_parts_of_first_candidate() {
        let body = r#"{"candidates":[
            {"content":{"role":"model","parts":[{"text":"Hello, "},{"text":"world."}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        assert_eq!(extract_text(body).unwrap().as_deref(), Some("Hello, world."));
    }

    #[test]
    fn extract_text_blank_is_none() {
        assert_eq!(extract_text(r#"{"candidates":[]}"#).unwrap(), None);
        assert_eq!(extract_text("{}").unwrap(), None);
        assert_eq!(
            extract_text(r#"{"candidates":[{"content":{"parts":[{"text":"  \n"}]}}]}"#).unwrap(),
            None
        );
        assert_eq!(
            extract_text(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap(),
            None
        );
    }

    #[test]
    fn api_error_reads_envelope() {
        let response = RawResponse {
            status: 404,
            body: r#"{"error":{"code":404,"message":"models/x is not found for API version v1","status":"NOT_FOUND"}}"#.into(),
        };
        match api_error(&response) {
            HuginnError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(
                    message,
                    "NOT_FOUND: models/x is not found for API version v1"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_body_or_status() {
        let plain = RawResponse {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(api_error(&plain).to_string(), "API error (502): Bad Gateway");

        let empty = RawResponse {
            status: 401,
            body: String::new(),
        };
        assert_eq!(api_error(&empty).to_string(), "API error (401): HTTP 401");
    }
}
