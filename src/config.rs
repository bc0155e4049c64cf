//! Service configuration
//!
//! Loaded from `codeattest.toml` in the working directory (or an explicit
//! `--config` path). Every field has a default, so an absent file is fine.
//! `WEBHOOK_DATA_DIRECTORY` in the environment overrides the payload directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::paths;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
    /// Datastore and payload locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Composition recalculation strategy
    #[serde(default)]
    pub recalculation: RecalculationConfig,
    /// Analytics emission
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(default = "paths::default_database")]
    pub database_path: PathBuf,
    /// Root of the dated webhook payload tree
    #[serde(default = "paths::default_webhook_dir")]
    pub webhook_data_directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: paths::default_database(),
            webhook_data_directory: paths::default_webhook_dir(),
        }
    }
}

/// How composition is recomputed after an attestation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecalculationMode {
    /// Inline, before the response (tests, debugging)
    Immediate,
    /// Through the job queue and background worker
    #[default]
    Deferred,
}

/// Recalculation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationConfig {
    /// Strategy
    #[serde(default)]
    pub mode: RecalculationMode,
    /// Seconds the worker sleeps when the queue is empty
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

const fn default_poll_interval() -> u64 {
    5
}

impl Default for RecalculationConfig {
    fn default() -> Self {
        Self {
            mode: RecalculationMode::default(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Analytics settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Emit attestation events
    #[serde(default = "default_true")]
    pub enabled: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Parse TOML content (no environment overrides)
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `codeattest.toml` in the
    /// working directory is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let local = paths::local_config();
                if local.exists() {
                    Self::read(&local)?
                } else {
                    log::debug!("No {} found, using defaults", paths::CONFIG_FILE);
                    Self::default()
                }
            },
        };
        config.apply_env();
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(paths::WEBHOOK_DATA_DIRECTORY_ENV)
            .filter(|v| !v.is_empty())
        {
            self.storage.webhook_data_directory = PathBuf::from(dir);
        }
    }

    /// Write the configuration as TOML
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// `host:port` for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
