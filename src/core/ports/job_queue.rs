//! Job queue port

use super::super::models::{Job, JobKind, QueuedJob};

/// Persistent FIFO of deferred work
pub trait JobQueue: Send + Sync {
    /// Append a job, returning its id
    fn enqueue(&self, job: &Job) -> anyhow::Result<i64>;

    /// Claim the oldest pending job of one of the given kinds
    fn claim(&self, kinds: &[JobKind]) -> anyhow::Result<Option<QueuedJob>>;

    /// Mark a claimed job done
    fn complete(&self, id: i64) -> anyhow::Result<()>;

    /// Mark a claimed job failed
    fn fail(&self, id: i64, error: &str) -> anyhow::Result<()>;

    /// Number of pending jobs of a kind
    fn pending(&self, kind: JobKind) -> anyhow::Result<usize>;
}
