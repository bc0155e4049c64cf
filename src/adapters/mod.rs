//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `sqlite/` - Datastore for repositories, attestations, webhooks, jobs, feedback
//! - `telemetry` - Log-backed analytics and error reporting

pub mod sqlite;
pub mod telemetry;

pub use sqlite::SqliteStore;
pub use telemetry::{LogAnalytics, LogErrorReporter};
