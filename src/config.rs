//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//! 4. built-in defaults when none of the above exists
//!
//! The API key is loaded separately with mandatory permission checks:
//! 1. `~/.huginn/secrets.toml` (user, must be 0600)
//! 2. `/etc/huginn/secrets.toml` (system, must be 0600)
//! 3. the `GEMINI_API_KEY` environment variable

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gemini::DEFAULT_BASE_URL;
use crate::retry::RetryPolicy;
use crate::selector::DEFAULT_PREFERRED_MODELS;
use crate::{HuginnError, Result};

/// Environment variable consulted when no secrets file provides a key.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Gemini endpoint and selection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// API base URL (default: the public Generative Language endpoint).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Models tried before the rest of each catalog, in order.
    #[serde(default = "default_preferred_models")]
    pub preferred_models: Vec<String>,
    #[serde(default)]
    pub listing: RetrySection,
    #[serde(default)]
    pub generation: RetrySection,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            preferred_models: default_preferred_models(),
            listing: RetrySection::default(),
            generation: RetrySection::default(),
        }
    }
}

impl GeminiConfig {
    /// Catalog listing policy: [`RetryPolicy::listing()`] plus overrides.
    pub fn listing_policy(&self) -> RetryPolicy {
        self.listing.resolve(RetryPolicy::listing())
    }

    /// Content generation policy: [`RetryPolicy::generation()`] plus overrides.
    pub fn generation_policy(&self) -> RetryPolicy {
        self.generation.resolve(RetryPolicy::generation())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_preferred_models() -> Vec<String> {
    DEFAULT_PREFERRED_MODELS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Overrides for one call site's retry policy. Unset fields keep the
/// preset's value, so `[gemini.generation]` with only `retries = 5` keeps
/// the 30s timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RetrySection {
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub base_delay_ms: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl RetrySection {
    pub fn resolve(&self, preset: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries.unwrap_or(preset.retries),
            base_delay: self
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(preset.base_delay),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(preset.timeout),
        }
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist; otherwise the first existing standard
    /// location wins, and defaults apply when there is none.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a specific config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn validate(&self) -> Result<()> {
        if self.gemini.base_url.trim().is_empty() {
            return Err(HuginnError::Configuration(
                "gemini.base_url must not be empty".to_string(),
            ));
        }
        if self.gemini.listing_policy().timeout.is_zero()
            || self.gemini.generation_policy().timeout.is_zero()
        {
            return Err(HuginnError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the config file path, if any.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

/// Secrets configuration (API key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub gemini: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl std::fmt::Debug for ApiKeySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeySecret")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the key may come from the
    /// environment).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".huginn").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/huginn/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Parse a specific secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(HuginnError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// The Gemini API key, falling back to `GEMINI_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.gemini
            .as_ref()
            .map(|s| s.api_key.clone())
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
