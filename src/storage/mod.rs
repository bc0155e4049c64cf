//! Filesystem storage
//!
//! Raw webhook payloads are kept as JSON files outside the database so they
//! can be replayed or inspected without touching the datastore.

/// Dated webhook payload files
pub mod webhook_files;

pub use webhook_files::{WebhookFileStore, slugify};
