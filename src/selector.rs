//! Model discovery and fallback across API versions.
//!
//! [`ModelSelector::generate`] hides catalog drift from callers: it lists
//! the models each API version offers, ranks them, and walks the ranking
//! until one produces text.
//!
//! # Fallback flow
//!
//! ```text
//! generate(key, prompt)
//!   │
//!   ├─► v1      list models ──✗──► skip version
//!   │            │
//!   │            └─► candidates (preferred first, then catalog order)
//!   │                  ├─► generate_content ──► text ───────────► done
//!   │                  ├─► 404 / NOT_FOUND / "not supported" ──► next candidate
//!   │                  ├─► 200 with blank text ─────────────────► next candidate
//!   │                  └─► anything else ───────────────────────► abort
//!   │
//!   ├─► v1beta  (same)
//!   │
//!   └─► NoWorkingModel { versions }
//! ```
//!
//! Nothing is cached between calls: every `generate` starts discovery from
//! scratch.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::GeminiConfig;
use crate::gemini::{ApiVersion, GeminiApi};
use crate::retry::RetryPolicy;
use crate::telemetry;
use crate::{HuginnError, Result};

/// Models tried ahead of the rest of the catalog, fastest and cheapest first.
pub const DEFAULT_PREFERRED_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-pro",
];

/// A prompt plus the key to spend on it.
#[derive(Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub api_key: String,
}

impl GenerationRequest {
    /// Build a request, rejecting blank prompts and keys.
    pub fn new(api_key: impl Into<String>, prompt: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let prompt = prompt.into();
        if api_key.trim().is_empty() {
            return Err(HuginnError::InvalidInput("API key is empty".into()));
        }
        if prompt.trim().is_empty() {
            return Err(HuginnError::InvalidInput("prompt is empty".into()));
        }
        Ok(Self { prompt, api_key })
    }

    /// Prompt length in characters.
    pub fn prompt_chars(&self) -> usize {
        self.prompt.chars().count()
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("prompt_chars", &self.prompt_chars())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Generated text and the version/model pair that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub version: ApiVersion,
    pub model: String,
    /// Never empty or whitespace-only.
    pub text: String,
}

/// One version's catalog, or why it could not be listed.
#[derive(Debug)]
pub struct VersionCatalog {
    pub version: ApiVersion,
    pub catalog: Result<Catalog>,
}

/// Finds a working (version, model) pair per request and generates text.
///
/// Holds configuration only; concurrent `generate` calls share nothing
/// mutable.
#[derive(Clone)]
pub struct ModelSelector {
    api: GeminiApi,
    versions: Vec<ApiVersion>,
    preferred: Vec<String>,
    listing: RetryPolicy,
    generation: RetryPolicy,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(GeminiApi::new())
    }
}

impl ModelSelector {
    /// Selector with default versions, preferences, and policies.
    pub fn new(api: GeminiApi) -> Self {
        Self {
            api,
            versions: ApiVersion::ALL.to_vec(),
            preferred: DEFAULT_PREFERRED_MODELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            listing: RetryPolicy::listing(),
            generation: RetryPolicy::generation(),
        }
    }

    /// Selector built from the `[gemini]` config section.
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self::new(GeminiApi::with_base_url(&config.base_url))
            .preferred_models(config.preferred_models.clone())
            .listing_policy(config.listing_policy())
            .generation_policy(config.generation_policy())
    }

    /// Replace the preferred-model list.
    pub fn preferred_models(mut self, models: Vec<String>) -> Self {
        self.preferred = models;
        self
    }

    pub fn listing_policy(mut self, policy: RetryPolicy) -> Self {
        self.listing = policy;
        self
    }

    pub fn generation_policy(mut self, policy: RetryPolicy) -> Self {
        self.generation = policy;
        self
    }

    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }

    /// Generate text for `request`, trying every version and candidate
    /// until one works.
    ///
    /// Version/model mismatches move on to the next candidate; any other
    /// failure aborts at once. When everything is exhausted the error names
    /// the versions that were checked.
    #[instrument(skip_all, fields(prompt_chars = request.prompt_chars()))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let start = Instant::now();
        let result = self.discover_and_generate(request).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        result
    }

    async fn discover_and_generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let mut checked = Vec::with_capacity(self.versions.len());

        for &version in &self.versions {
            checked.push(version);

            let catalog = match self
                .api
                .list_models(&request.api_key, version, &self.listing)
                .await
            {
                Ok(catalog) => catalog,
                Err(e) => {
                    warn!(%version, error = %e, "model listing failed, trying next version");
                    record_fallback(version, "listing_failed");
                    continue;
                }
            };

            if let Some(result) = self.try_candidates(request, version, &catalog).await? {
                return Ok(result);
            }
        }

        Err(HuginnError::NoWorkingModel { versions: checked })
    }

    /// Walk one version's ranked candidates.
    ///
    /// `Ok(None)` means every candidate mismatched and the caller should
    /// move to the next version; `Err` is fatal.
    async fn try_candidates(
        &self,
        request: &GenerationRequest,
        version: ApiVersion,
        catalog: &Catalog,
    ) -> Result<Option<GenerationResult>> {
        let (candidates, incapable) = catalog.split_candidates(&self.preferred);
        for model in incapable {
            debug!(%version, model, "skipping model without generateContent");
            record_fallback(version, "incapable");
        }

        for model in candidates {
            match self
                .api
                .generate_content(
                    &request.api_key,
                    version,
                    model,
                    &request.prompt,
                    &self.generation,
                )
                .await
            {
                Ok(text) => {
                    info!(%version, model, "generation succeeded");
                    return Ok(Some(GenerationResult {
                        version,
                        model: model.to_string(),
                        text,
                    }));
                }
                Err(e) if e.is_mismatch() => {
                    debug!(%version, model, error = %e, "model unusable, trying next candidate");
                    record_fallback(version, "mismatch");
                }
                Err(e) => {
                    warn!(%version, model, error = %e, "generation failed");
                    return Err(e);
                }
            }
        }

        Ok(None)
    }

    /// List every configured version's catalog without generating anything.
    ///
    /// Listing errors are returned per version rather than aborting.
    pub async fn list_catalogs(&self, api_key: &str) -> Vec<VersionCatalog> {
        let mut catalogs = Vec::with_capacity(self.versions.len());
        for &version in &self.versions {
            let catalog = self.api.list_models(api_key, version, &self.listing).await;
            catalogs.push(VersionCatalog { version, catalog });
        }
        catalogs
    }
}

fn record_fallback(version: ApiVersion, reason: &'static str) {
    metrics::counter!(telemetry::FALLBACKS_TOTAL,
        "version" => version.as_str(),
        "reason" => reason,
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_blank_inputs() {
        assert!(matches!(
            GenerationRequest::new("", "prompt"),
            Err(HuginnError::InvalidInput(_))
        ));
        assert!(matches!(
            GenerationRequest::new("key", "  \n"),
            Err(HuginnError::InvalidInput(_))
        ));
        assert!(GenerationRequest::new("key", "prompt").is_ok());
    }

    #[test]
    fn request_debug_redacts_key() {
        let request = GenerationRequest::new("AIza-secret-key", "hello").unwrap();
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("hello"));
    }

    #[test]
    fn prompt_length_counts_characters() {
        let request = GenerationRequest::new("key", "Zürich café").unwrap();
        assert_eq!(request.prompt_chars(), 11);
        assert!(format!("{request:?}").contains("prompt_chars: 11"));
    }

    #[test]
    fn defaults() {
        let selector = ModelSelector::new(GeminiApi::with_base_url("http://localhost"));
        assert_eq!(selector.versions, vec![ApiVersion::V1, ApiVersion::V1Beta]);
        assert_eq!(selector.preferred()[0], "gemini-2.5-flash");
        assert_eq!(selector.listing, RetryPolicy::listing());
        assert_eq!(selector.generation, RetryPolicy::generation());
    }
}
