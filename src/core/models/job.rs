//! Background jobs
//!
//! Work handed off so an HTTP response does not wait on it.

use serde::{Deserialize, Serialize};

/// A unit of deferred work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    /// Recompute composition for these commits
    RecalculateComposition {
        /// Commit row ids
        commit_ids: Vec<i64>,
    },
    /// Ask the analysis pipeline to (re)analyze a pull request
    AnalyzePullRequest {
        /// Repository row id
        repository_id: i64,
        /// Provider-side PR number
        pr_number: i64,
        /// Head commit to analyze
        head_commit_sha: String,
    },
}

/// Discriminant of [`Job`], used to claim only what a worker can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// [`Job::RecalculateComposition`]
    RecalculateComposition,
    /// [`Job::AnalyzePullRequest`]
    AnalyzePullRequest,
}

impl JobKind {
    /// Stable string stored alongside the job
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecalculateComposition => "recalculate_composition",
            Self::AnalyzePullRequest => "analyze_pull_request",
        }
    }
}

impl Job {
    /// Kind of this job
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::RecalculateComposition { .. } => JobKind::RecalculateComposition,
            Self::AnalyzePullRequest { .. } => JobKind::AnalyzePullRequest,
        }
    }
}

/// A job claimed from the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedJob {
    /// Queue row id
    pub id: i64,
    /// The work
    pub job: Job,
    /// Previous attempts
    pub attempts: u32,
}
