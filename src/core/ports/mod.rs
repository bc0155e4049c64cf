//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between core business logic
//! and external systems (database, filesystem, analytics, error tracking).
//!
//! Implementations live in the `adapters` and `storage` modules.

mod analytics;
mod code_repo;
mod composition_store;
mod error_reporter;
mod feedback_repo;
mod job_queue;
mod payload_store;
mod scheduler;
mod webhook_repo;

pub use analytics::AnalyticsSink;
pub use code_repo::CodeRepository;
pub use composition_store::CompositionStore;
pub use error_reporter::{ErrorReporter, ErrorTags};
pub use feedback_repo::FeedbackRepository;
pub use job_queue::JobQueue;
pub use payload_store::{PayloadStore, PayloadStoreError};
pub use scheduler::RecalculationScheduler;
pub use webhook_repo::WebhookRequestRepository;
