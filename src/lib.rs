//! Huginn - resilient Gemini content generation
//!
//! Gemini's model catalog and API versions drift without notice: models are
//! renamed, deprecated, or only offered on one version. Huginn does not pin
//! a model. Each call lists what every API version currently offers, ranks
//! the candidates, and falls back across them, retrying transient failures
//! with exponential backoff along the way.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{ArticlePrompt, GenerationRequest, ModelSelector};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let selector = ModelSelector::default();
//!     let prompt = ArticlePrompt::summarize("Full article text...")?.render();
//!     let request = GenerationRequest::new("your-gemini-key", prompt)?;
//!
//!     let result = selector.generate(&request).await?;
//!     println!("[{} {}] {}", result.version, result.model, result.text);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod retry;
pub mod selector;
pub mod telemetry;
pub mod transport;
mod version;

pub use version::{PKG_VERSION, version_string};

// Re-export main types at crate root
pub use catalog::{Capability, Catalog, ModelDescriptor};
pub use config::{Config, GeminiConfig, Secrets};
pub use error::{ErrorBody, HuginnError, Result};
pub use gemini::{ApiVersion, GeminiApi};
pub use prompt::ArticlePrompt;
pub use retry::{RetryPolicy, with_retry};
pub use selector::{GenerationRequest, GenerationResult, ModelSelector, VersionCatalog};
pub use transport::{CallOutcome, HttpRequest, HttpTransport, RawResponse, Transport};
