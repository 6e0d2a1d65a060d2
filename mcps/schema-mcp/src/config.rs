//! Configuration for Schema MCP Server
//!
//! Loaded from:
//! 1. `SCHEMA_CONFIG_PATH` environment variable
//! 2. `~/.binks/schema.toml`
//! 3. Defaults, when neither file exists
//!
//! `DATABASE_URL`, `API_BASE_URL` and `API_TOKEN` override the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::analysis::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::error::{SchemaError, SchemaResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite:///data/app.db`
    pub url: Option<String>,

    /// How long SQLite waits on a locked database, in seconds.
    /// Default: 30
    #[serde(default = "default_timeout")]
    pub busy_timeout_secs: u64,
}

/// Remote schema service. Disabled unless `base_url` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,

    /// Sent as a bearer token when present
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    /// Default: 30
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum rule confidence for a field to count as business or system
    /// instead of uncertain. Default: 0.7
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
}

fn default_timeout() -> u64 {
    30
}

fn default_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            busy_timeout_secs: default_timeout(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
        }
    }
}

impl SchemaConfig {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from: {}", path.display());
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config from {:?}", path))?;
                Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse config from {:?}", path))?
            }
            Some(path) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            None => {
                tracing::warn!("Could not determine home directory, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SCHEMA_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(".binks").join("schema.toml"))
    }

    /// Apply environment-style overrides. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(url) = lookup("API_BASE_URL") {
            self.api.base_url = Some(url);
        }
        if let Some(token) = lookup("API_TOKEN") {
            self.api.token = Some(token);
        }
    }

    /// The configured database URL.
    ///
    /// Missing from both the file and the environment is a configuration
    /// error; the server cannot start without it.
    pub fn database_url(&self) -> SchemaResult<&str> {
        self.database.url.as_deref().ok_or_else(|| {
            SchemaError::Configuration(
                "DATABASE_URL is required (set it in the environment or [database].url)".into(),
            )
        })
    }
}
