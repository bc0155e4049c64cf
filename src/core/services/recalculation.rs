//! Composition recalculation strategies
//!
//! [`ImmediateRecalculation`] recomputes inline and is meant for tests and
//! debug setups. [`DeferredRecalculation`] enqueues a job for the worker so
//! the HTTP response never waits on the recomputation.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info};

use crate::core::models::{Composition, Job};
use crate::core::ports::{CompositionStore, JobQueue, RecalculationScheduler};

/// Recompute and store composition for each commit.
///
/// Returns the number of commits recomputed.
pub fn recalculate_commits(
    store: &dyn CompositionStore,
    commit_ids: &[i64],
) -> anyhow::Result<usize> {
    let unique: BTreeSet<i64> = commit_ids.iter().copied().collect();
    for &commit_id in &unique {
        let counts = store.commit_line_counts(commit_id)?;
        let composition = Composition::from_line_counts(counts);
        debug!(
            "Commit {commit_id}: ai {:.2}% human {:.2}% blended {:.2}% over {} lines",
            composition.ai, composition.human, composition.blended, composition.total_lines
        );
        store.save_composition(commit_id, &composition)?;
    }
    Ok(unique.len())
}

/// Recompute inline
#[derive(Clone)]
pub struct ImmediateRecalculation {
    store: Arc<dyn CompositionStore>,
}

impl ImmediateRecalculation {
    /// Create over a composition store
    #[must_use]
    pub fn new(store: Arc<dyn CompositionStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for ImmediateRecalculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ImmediateRecalculation")
    }
}

impl RecalculationScheduler for ImmediateRecalculation {
    fn schedule(&self, commit_ids: &[i64]) -> anyhow::Result<()> {
        let n = recalculate_commits(self.store.as_ref(), commit_ids)?;
        info!("Recalculated composition for {n} commit(s) inline");
        Ok(())
    }
}

/// Enqueue for the background worker
#[derive(Clone)]
pub struct DeferredRecalculation {
    queue: Arc<dyn JobQueue>,
}

impl DeferredRecalculation {
    /// Create over a job queue
    #[must_use]
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }
}

impl std::fmt::Debug for DeferredRecalculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeferredRecalculation")
    }
}

impl RecalculationScheduler for DeferredRecalculation {
    fn schedule(&self, commit_ids: &[i64]) -> anyhow::Result<()> {
        if commit_ids.is_empty() {
            return Ok(());
        }
        let unique: BTreeSet<i64> = commit_ids.iter().copied().collect();
        let job = Job::RecalculateComposition {
            commit_ids: unique.into_iter().collect(),
        };
        let id = self.queue.enqueue(&job)?;
        debug!("Enqueued recalculation job {id}");
        Ok(())
    }
}
