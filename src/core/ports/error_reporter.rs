//! Error-tracking sink port
//!
//! Failures that must not abort a response are captured here with tags.

use std::collections::BTreeMap;

/// Contextual tags attached to a captured error
pub type ErrorTags = BTreeMap<String, String>;

/// Destination for errors that are swallowed on the request path
pub trait ErrorReporter: Send + Sync {
    /// Capture an error with context
    fn capture(&self, error: &anyhow::Error, tags: &ErrorTags);

    /// Capture a non-error condition worth tracking
    fn message(&self, message: &str, tags: &ErrorTags);
}
