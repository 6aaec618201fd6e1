//! Centralized configuration for romart.
//!
//! Constants live on unit structs grouped by concern; the runtime settings a
//! caller supplies (user agent, timeout, retries and the ordered source list)
//! are deserialized into [`ResolverSettings`].

use crate::{ArtworkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const USER_AGENT: &'static str = concat!("romart/", env!("CARGO_PKG_VERSION"));
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_millis(10_000);
    pub const RETRY_MAX_JITTER: Duration = Duration::from_millis(200);
    pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];
}

/// Per-source defaults for the built-in adapters.
pub struct AdapterConfig;

impl AdapterConfig {
    pub const LIBRETRO_BASE_URL: &'static str = "https://thumbnails.libretro.com";
    pub const LIBRETRO_DELAY: Duration = Duration::from_millis(100);
    pub const GITHUB_API_BASE: &'static str = "https://api.github.com";
    pub const GITHUB_RAW_BASE: &'static str = "https://raw.githubusercontent.com";
    pub const GITHUB_THUMBNAILS_ORG: &'static str = "libretro-thumbnails";
    pub const GITHUB_DEFAULT_BRANCH: &'static str = "master";
    pub const GITHUB_DELAY: Duration = Duration::from_millis(250);
    pub const SCREENSCRAPER_BASE_URL: &'static str = "https://api.screenscraper.fr/api2";
    pub const SCREENSCRAPER_DELAY: Duration = Duration::from_millis(1200);
    pub const SCREENSCRAPER_CACHE_TTL: Duration = Duration::from_secs(3600);
    pub const SCREENSCRAPER_CACHE_CAPACITY: u64 = 10_000;
    pub const URL_TEMPLATE_DELAY: Duration = Duration::from_millis(500);
}

/// Batch runner defaults.
pub struct BatchConfig;

impl BatchConfig {
    pub const DEFAULT_CONCURRENCY: usize = 4;
    pub const MAX_CONCURRENCY: usize = 32;
}

/// One entry of the ordered source list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterSourceConfig {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lower values are tried first.
    #[serde(default)]
    pub priority: i32,
    /// Adapter-specific options, parsed by the adapter's factory.
    #[serde(default = "empty_options")]
    pub options: serde_json::Value,
}

impl AdapterSourceConfig {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            priority,
            options: empty_options(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }
}

/// Global settings for a resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub user_agent: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub sources: Vec<AdapterSourceConfig>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            user_agent: NetworkConfig::USER_AGENT.to_string(),
            timeout_ms: NetworkConfig::REQUEST_TIMEOUT.as_millis() as u64,
            retries: NetworkConfig::MAX_RETRIES,
            sources: vec![
                AdapterSourceConfig::new("libretro", 1),
                AdapterSourceConfig::new("libretro-github", 2),
                AdapterSourceConfig::new("screenscraper", 3).disabled(),
            ],
        }
    }
}

impl ResolverSettings {
    /// Parse settings from a JSON document; missing fields take defaults.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ArtworkError::io_with_path(e, path))?;
        Self::from_json_str(&contents)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Shape checks only; semantic validation belongs to the config loader.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(ArtworkError::Validation {
                field: "timeout_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.retries > 10 {
            return Err(ArtworkError::Validation {
                field: "retries".into(),
                message: format!("{} exceeds the maximum of 10", self.retries),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ArtworkError::Validation {
                field: "user_agent".into(),
                message: "must not be empty".into(),
            });
        }
        for (i, source) in self.sources.iter().enumerate() {
            if source.id.trim().is_empty() {
                return Err(ArtworkError::Validation {
                    field: format!("sources[{}].id", i),
                    message: "must not be empty".into(),
                });
            }
            if !source.options.is_object() && !source.options.is_null() {
                return Err(ArtworkError::Validation {
                    field: format!("sources[{}].options", i),
                    message: "must be a JSON object".into(),
                });
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn empty_options() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
