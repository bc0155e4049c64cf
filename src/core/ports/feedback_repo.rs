//! Feedback repository port

use super::super::models::{Feedback, FeedbackFilter, NewFeedback};

/// Persistence for detection feedback
pub trait FeedbackRepository: Send + Sync {
    /// Insert feedback
    fn create(&self, feedback: &NewFeedback) -> anyhow::Result<Feedback>;

    /// List feedback, newest first
    fn list(&self, filter: FeedbackFilter) -> anyhow::Result<Vec<Feedback>>;
}
