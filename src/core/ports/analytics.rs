//! Analytics sink port

use super::super::models::AnalyticsEvent;

/// Destination for product analytics events
pub trait AnalyticsSink: Send + Sync {
    /// Send one event
    fn capture(&self, event: &AnalyticsEvent) -> anyhow::Result<()>;
}
