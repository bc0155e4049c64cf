//! Domain models for codeattest
//!
//! Pure data structures with no I/O dependencies.
//!
//! - [`CodeChunk`] - a fragment of analyzed code, identified by content hash
//! - [`CodeAttestation`] - "every chunk with this hash is human/AI/..."
//! - [`InboundWebhook`] / [`WebhookRequest`] - provider notifications
//! - [`Composition`] - label breakdown of a commit
//! - [`Job`] - deferred work

mod analytics;
mod attestation;
mod code;
mod composition;
mod feedback;
mod job;
mod label;
mod webhook;

pub use analytics::{AnalyticsEvent, AttestAction};
pub use attestation::{
    AttestationInput, CodeAttestation, MAX_CODE_HASH_LEN, Upserted, ValidAttestation,
    ValidationError, normalize_code_hash,
};
pub use code::{
    AttestedTargets, CodeChunk, Commit, NewChunk, Organization, PullRequest, Repository,
    RepositoryFile,
};
pub use composition::Composition;
pub use feedback::{
    COMMENT_TRUNCATE_LEN, Feedback, FeedbackFilter, FeedbackStatus, FeedbackVote, NewFeedback,
};
pub use job::{Job, JobKind, QueuedJob};
pub use label::CodeLabel;
pub use webhook::{InboundWebhook, NewWebhookRequest, StoreOutcome, WebhookRequest, WebhookResponse};
