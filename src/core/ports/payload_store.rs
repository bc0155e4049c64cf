//! Raw webhook payload storage port

use thiserror::Error;

use super::super::models::{InboundWebhook, StoreOutcome};

/// Errors while persisting a raw payload
#[derive(Debug, Error)]
pub enum PayloadStoreError {
    /// Could not create the dated directory
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Could not write the payload file
    #[error("failed to write {path}: {source}")]
    Write {
        /// File that could not be written
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Payload could not be serialized
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Stores raw webhook payloads exactly once per delivery
pub trait PayloadStore: Send + Sync {
    /// Persist the request under a path derived from the provider and the
    /// value of `identifying_header`
    fn store(
        &self,
        provider: &str,
        identifying_header: &str,
        request: &InboundWebhook,
    ) -> Result<StoreOutcome, PayloadStoreError>;
}
