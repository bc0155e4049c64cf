//! Log-backed analytics and error reporting
//!
//! Both sinks write structured lines through the `log` facade so a log
//! shipper can forward them to the real analytics/error-tracking services.

use log::{debug, error, info, warn};

use crate::core::models::AnalyticsEvent;
use crate::core::ports::{AnalyticsSink, ErrorReporter, ErrorTags};

/// Analytics sink that logs each event as JSON
#[derive(Debug, Clone, Copy)]
pub struct LogAnalytics {
    enabled: bool,
}

impl LogAnalytics {
    /// Create a sink; a disabled sink drops events at debug level
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether events are emitted
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for LogAnalytics {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AnalyticsSink for LogAnalytics {
    fn capture(&self, event: &AnalyticsEvent) -> anyhow::Result<()> {
        if !self.enabled {
            debug!("analytics disabled, dropping {}", event.event);
            return Ok(());
        }
        let line = serde_json::to_string(event)?;
        info!(target: "codeattest::analytics", "{line}");
        Ok(())
    }
}

/// Error reporter that logs errors with their tags
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorReporter;

fn render_tags(tags: &ErrorTags) -> String {
    tags.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ")
}

impl ErrorReporter for LogErrorReporter {
    fn capture(&self, err: &anyhow::Error, tags: &ErrorTags) {
        error!(target: "codeattest::errors", "{err:#} [{}]", render_tags(tags));
    }

    fn message(&self, message: &str, tags: &ErrorTags) {
        warn!(target: "codeattest::errors", "{message} [{}]", render_tags(tags));
    }
}
