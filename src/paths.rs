//! Centralized path definitions for codeattest
//!
//! ## Storage Layout
//!
//! ```text
//! ./codeattest.toml              # Service configuration (optional)
//!
//! ~/.codeattest/
//! ├── codeattest.db              # SQLite datastore
//! └── webhooks/                  # Raw webhook payloads
//!     └── YYYY/MM/DD/HH/{provider}-{delivery}.json
//! ```

use std::path::PathBuf;

/// Configuration filename looked up in the working directory
pub const CONFIG_FILE: &str = "codeattest.toml";

/// Environment variable overriding the webhook payload directory
pub const WEBHOOK_DATA_DIRECTORY_ENV: &str = "WEBHOOK_DATA_DIRECTORY";

/// Data directory name under the home directory
const DATA_DIR: &str = ".codeattest";

const DATABASE_FILE: &str = "codeattest.db";

const WEBHOOKS_DIR: &str = "webhooks";

/// Get the data directory.
///
/// Returns `~/.codeattest/`.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(DATA_DIR)
}

/// Default datastore location
#[must_use]
pub fn default_database() -> PathBuf {
    data_dir().join(DATABASE_FILE)
}

/// Default webhook payload directory
#[must_use]
pub fn default_webhook_dir() -> PathBuf {
    data_dir().join(WEBHOOKS_DIR)
}

/// `codeattest.toml` in the working directory
#[must_use]
pub fn local_config() -> PathBuf {
    PathBuf::from(CONFIG_FILE)
}
