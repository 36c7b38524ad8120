//! Configuration management for the BuiltWith client.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. The API key is only ever read from the
//! environment (or set programmatically) and is never serialized.

use crate::error::{BuiltWithError, ConfigError, ConfigResult};
use crate::types::ApiKey;
use crate::MAX_DOMAINS_PER_REQUEST;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BUILTWITH_API_KEY";
/// Environment variable overriding the service base URL.
pub const BASE_URL_ENV: &str = "BUILTWITH_BASE_URL";
/// Environment variable overriding the request timeout.
pub const TIMEOUT_ENV: &str = "BUILTWITH_TIMEOUT_SECS";

/// Main client configuration.
///
/// This is loaded from `~/.config/builtwith/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Service endpoint settings
    pub api: ApiConfig,
    /// Keyword batching settings
    pub batch: BatchConfig,
    /// Technology list pagination settings
    pub pagination: PaginationConfig,
    /// API key (environment only)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if absent.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `BUILTWITH_API_KEY`: API key
    /// - `BUILTWITH_BASE_URL`: Override the service base URL
    /// - `BUILTWITH_TIMEOUT_SECS`: Override the request timeout
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV) {
            tracing::debug!("API key taken from {API_KEY_ENV}");
            self.api_key = Some(key);
        }

        if let Some(url) = lookup(BASE_URL_ENV) {
            tracing::debug!("Override api.base_url from env: {}", url);
            self.api.base_url = url;
        }

        if let Some(val) = lookup(TIMEOUT_ENV) {
            let secs = val.parse().map_err(|_| ConfigError::InvalidValue {
                field: TIMEOUT_ENV.to_string(),
                reason: format!("expected whole seconds, got '{val}'"),
            })?;
            tracing::debug!("Override api.timeout_secs from env: {}", secs);
            self.api.timeout_secs = secs;
        }

        self.validate()
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: format!("must be an http(s) URL, got '{base_url}'"),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.batch.batch_size == 0 || self.batch.batch_size > MAX_DOMAINS_PER_REQUEST {
            return Err(ConfigError::InvalidValue {
                field: "batch.batch_size".to_string(),
                reason: format!(
                    "must be between 1 and {MAX_DOMAINS_PER_REQUEST}, got {}",
                    self.batch.batch_size
                ),
            });
        }
        Ok(())
    }

    /// The configured API key.
    ///
    /// # Errors
    /// Returns a configuration error if no key is set or the key is blank.
    pub fn api_key(&self) -> Result<ApiKey, BuiltWithError> {
        match &self.api_key {
            Some(key) => ApiKey::new(key.clone()),
            None => Err(ConfigError::MissingApiKey {
                env_var: API_KEY_ENV,
            }
            .into()),
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/builtwith/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "builtwith", "builtwith").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it
    pub base_url: String,
    /// Request timeout in seconds, enforced by the transport
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.builtwith.com".to_string(),
            timeout_secs: 30,
            user_agent: format!("builtwith-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Keyword batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Domains per keywords request (1-16)
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_DOMAINS_PER_REQUEST,
        }
    }
}

/// Technology list pagination settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Default page limit (unset = follow the service to exhaustion)
    pub max_pages: Option<usize>,
}
