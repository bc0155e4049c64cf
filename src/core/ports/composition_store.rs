//! Composition store port

use super::super::models::{CodeLabel, Commit, Composition};

/// Read chunk line counts and persist computed compositions
pub trait CompositionStore: Send + Sync {
    /// `(effective label, line count)` for every chunk of the commit
    fn commit_line_counts(&self, commit_id: i64) -> anyhow::Result<Vec<(Option<CodeLabel>, u64)>>;

    /// Store the composition and clear the recalculation flag
    fn save_composition(&self, commit_id: i64, composition: &Composition) -> anyhow::Result<()>;

    /// Look up a commit by SHA within a repository
    fn commit_by_sha(&self, repository_id: i64, sha: &str) -> anyhow::Result<Option<Commit>>;
}
