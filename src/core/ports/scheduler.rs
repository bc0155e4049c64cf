//! Composition recalculation scheduling port

/// Strategy for recomputing composition after an attestation
///
/// Immediate and deferred implementations live in `core::services`.
pub trait RecalculationScheduler: Send + Sync {
    /// Schedule recomputation for the given commits
    fn schedule(&self, commit_ids: &[i64]) -> anyhow::Result<()>;
}
