//! Code repository port
//!
//! Defines the interface for attestations and the chunks they broadcast to.

use chrono::{DateTime, Utc};

use super::super::models::{
    AttestedTargets, CodeAttestation, CodeChunk, PullRequest, Repository, Upserted,
    ValidAttestation,
};

/// Storage for repositories, chunks, and attestations
///
/// Implementations own the (repository, hash) uniqueness of attestations.
pub trait CodeRepository: Send + Sync {
    /// Look up a repository by its public id
    fn repository_by_public_id(&self, public_id: &str) -> anyhow::Result<Option<Repository>>;

    /// Look up a repository by provider full name (`owner/name`)
    fn repository_by_full_name(&self, full_name: &str) -> anyhow::Result<Option<Repository>>;

    /// Find or create the attestation for (repository, hash)
    ///
    /// An existing row is relabelled in place; its id never changes.
    fn upsert_attestation(
        &self,
        repository: &Repository,
        attestation: &ValidAttestation,
    ) -> anyhow::Result<Upserted>;

    /// Get the attestation for (repository, hash), if any
    fn attestation(
        &self,
        repository_id: i64,
        code_hash: &str,
    ) -> anyhow::Result<Option<CodeAttestation>>;

    /// All chunks in an organization with the given hash, ordered by id
    fn chunks_with_hash(
        &self,
        organization_id: i64,
        code_hash: &str,
    ) -> anyhow::Result<Vec<CodeChunk>>;

    /// Point the chunks at the attestation and stamp `last_attested_at` on
    /// every file, commit, and pull request they reach
    fn assign_attestation(
        &self,
        attestation_id: i64,
        chunk_ids: &[i64],
        attested_at: DateTime<Utc>,
    ) -> anyhow::Result<AttestedTargets>;

    /// Flag commits whose composition cache is now stale
    fn mark_needs_recalculation(&self, commit_ids: &[i64]) -> anyhow::Result<()>;

    /// Look up a pull request by number
    fn pull_request(
        &self,
        repository_id: i64,
        pr_number: i64,
    ) -> anyhow::Result<Option<PullRequest>>;

    /// Create or move the head of a pull request
    fn upsert_pull_request(
        &self,
        repository_id: i64,
        pr_number: i64,
        head_commit_sha: &str,
    ) -> anyhow::Result<PullRequest>;
}
