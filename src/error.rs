//! Huginn error types

use serde::Serialize;

use crate::gemini::ApiVersion;

/// HTTP statuses worth another attempt against the same endpoint.
pub(crate) const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Provider/network errors
    /// Timeout or network-level failure (DNS, connection reset).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Upstream answered 2xx but produced no usable text.
    #[error("empty response from model {model}")]
    EmptyResponse { model: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no working model found (checked API versions: {})", format_versions(.versions))]
    NoWorkingModel { versions: Vec<ApiVersion> },
}

fn format_versions(versions: &[ApiVersion]) -> String {
    if versions.is_empty() {
        return "none".to_string();
    }
    versions
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl HuginnError {
    /// Whether a retry against the same endpoint may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            HuginnError::Transport(_) => true,
            HuginnError::Api { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }

    /// Whether this failure means "wrong model or API version" rather than
    /// a real problem with the request, key, or quota.
    ///
    /// Matching on message text is best-effort; anything unrecognised is
    /// treated as fatal.
    pub fn is_mismatch(&self) -> bool {
        match self {
            HuginnError::Api { status, message } => {
                *status == 404
                    || message.contains("NOT_FOUND")
                    || message.to_lowercase().contains("not supported")
            }
            HuginnError::EmptyResponse { .. } => true,
            _ => false,
        }
    }

    /// Status code the HTTP handler layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            HuginnError::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}

/// JSON error body returned by the HTTP handler layer: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&HuginnError> for ErrorBody {
    fn from(err: &HuginnError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_are_transient() {
        for status in RETRYABLE_STATUSES {
            let err = HuginnError::Api {
                status,
                message: "busy".into(),
            };
            assert!(err.is_transient(), "{status} should be transient");
        }
        let err = HuginnError::Api {
            status: 400,
            message: "bad request".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn mismatch_detection() {
        let not_found = HuginnError::Api {
            status: 404,
            message: "whatever".into(),
        };
        assert!(not_found.is_mismatch());

        let coded = HuginnError::Api {
            status: 400,
            message: "NOT_FOUND: models/foo".into(),
        };
        assert!(coded.is_mismatch());

        let unsupported = HuginnError::Api {
            status: 400,
            message: "models/foo is Not Supported for generateContent".into(),
        };
        assert!(unsupported.is_mismatch());

        let auth = HuginnError::Api {
            status: 403,
            message: "PERMISSION_DENIED: API key not valid".into(),
        };
        assert!(!auth.is_mismatch());

        let missing_key = HuginnError::Api {
            status: 400,
            message: "INVALID_ARGUMENT: API key not found. Please pass a valid API key.".into(),
        };
        assert!(!missing_key.is_mismatch());

        assert!(!HuginnError::Transport("timed out".into()).is_mismatch());
    }

    #[test]
    fn no_working_model_names_versions() {
        let err = HuginnError::NoWorkingModel {
            versions: vec![ApiVersion::V1, ApiVersion::V1Beta],
        };
        assert_eq!(
            err.to_string(),
            "no working model found (checked API versions: v1, v1beta)"
        );
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(HuginnError::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(HuginnError::Transport("x".into()).http_status(), 500);
        let body = ErrorBody::from(&HuginnError::InvalidInput("prompt is empty".into()));
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"invalid input: prompt is empty"}"#
        );
    }
}
