//! Background worker draining `recalculate_composition` jobs
//!
//! `analyze_pull_request` jobs stay pending for the external analysis
//! pipeline; this worker never claims them.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::core::models::{Job, JobKind, QueuedJob};
use crate::core::ports::{CompositionStore, JobQueue};
use crate::core::services::recalculate_commits;

const CLAIMED_KINDS: &[JobKind] = &[JobKind::RecalculateComposition];

/// Polls the job queue and recomputes composition
#[derive(Clone)]
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn CompositionStore>,
    poll_interval: Duration,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker").field("poll_interval", &self.poll_interval).finish_non_exhaustive()
    }
}

impl Worker {
    /// Create a worker over a queue and a composition store
    #[must_use]
    pub fn new(
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn CompositionStore>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            store,
            poll_interval,
        }
    }

    /// Claim and run at most one job.
    ///
    /// Returns whether a job was claimed. A failing job is marked failed and
    /// does not make this call fail.
    pub fn run_once(&self) -> anyhow::Result<bool> {
        let Some(queued) = self.queue.claim(CLAIMED_KINDS)? else {
            return Ok(false);
        };
        let QueuedJob { id, job, attempts } = queued;
        debug!("Running job {id} ({}), attempt {}", job.kind().as_str(), attempts + 1);

        let result = match &job {
            Job::RecalculateComposition { commit_ids } => {
                recalculate_commits(self.store.as_ref(), commit_ids).map(|n| {
                    info!("Job {id}: recalculated composition for {n} commit(s)");
                })
            },
            Job::AnalyzePullRequest { .. } => {
                Err(anyhow::anyhow!("{} is not handled by this worker", job.kind().as_str()))
            },
        };

        match result {
            Ok(()) => self.queue.complete(id)?,
            Err(e) => {
                warn!("Job {id} failed: {e:#}");
                self.queue.fail(id, &format!("{e:#}"))?;
            },
        }
        Ok(true)
    }

    /// Run jobs until the queue has none left, returning how many ran
    pub fn drain(&self) -> anyhow::Result<usize> {
        let mut ran = 0;
        while self.run_once()? {
            ran += 1;
        }
        Ok(ran)
    }

    /// Run forever on a background thread
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || {
            info!("Recalculation worker polling every {:?}", self.poll_interval);
            loop {
                match self.drain() {
                    Ok(0) => {},
                    Ok(n) => debug!("Worker ran {n} job(s)"),
                    Err(e) => error!("Worker error: {e:#}"),
                }
                thread::sleep(self.poll_interval);
            }
        })
    }
}
