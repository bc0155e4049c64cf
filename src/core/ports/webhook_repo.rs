//! Webhook request repository port

use super::super::models::{NewWebhookRequest, WebhookRequest};

/// Persistence for [`WebhookRequest`] records
pub trait WebhookRequestRepository: Send + Sync {
    /// Insert a record for a freshly stored payload
    fn insert(&self, request: &NewWebhookRequest) -> anyhow::Result<WebhookRequest>;

    /// Record the processor's answer on an existing record
    fn record_response(&self, id: i64, status: u16, message: &str) -> anyhow::Result<()>;

    /// Get a record by id
    fn get(&self, id: i64) -> anyhow::Result<Option<WebhookRequest>>;
}
