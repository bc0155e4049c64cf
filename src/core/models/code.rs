//! Repository code model
//!
//! Organizations own repositories; repositories own commits, commits own
//! files, files own chunks. Pull requests point at a head commit by SHA.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::CodeLabel;

/// A customer organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Row id
    pub id: i64,
    /// Display name
    pub name: String,
}

/// A source repository connected to an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Row id
    pub id: i64,
    /// Opaque identifier exposed in URLs
    pub public_id: String,
    /// `owner/name` as reported by the provider
    pub full_name: String,
    /// Owning organization
    pub organization_id: i64,
}

/// An analyzed commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Row id
    pub id: i64,
    /// Owning repository
    pub repository_id: i64,
    /// Commit SHA
    pub sha: String,
    /// Last time any chunk of this commit was attested
    pub last_attested_at: Option<DateTime<Utc>>,
    /// Cached composition, if it has been computed
    pub ai_composition: Option<super::Composition>,
    /// Set when an attestation changed and the cache is stale
    pub needs_composition_recalculation: bool,
}

/// A file within an analyzed commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFile {
    /// Row id
    pub id: i64,
    /// Owning commit
    pub commit_id: i64,
    /// Path relative to the repository root
    pub file_path: String,
    /// Last time any chunk of this file was attested
    pub last_attested_at: Option<DateTime<Utc>>,
}

/// A pull request tracked for composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Row id
    pub id: i64,
    /// Owning repository
    pub repository_id: i64,
    /// Provider-side number
    pub pr_number: i64,
    /// SHA of the head commit
    pub head_commit_sha: String,
    /// Last time any chunk of the head commit was attested
    pub last_attested_at: Option<DateTime<Utc>>,
}

/// A fragment of a file's code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Row id
    pub id: i64,
    /// Owning file
    pub file_id: i64,
    /// Content hash shared by identical fragments
    pub code_hash: String,
    /// First line (1-indexed, inclusive)
    pub code_line_start: u32,
    /// Last line (1-indexed, inclusive)
    pub code_line_end: u32,
    /// Label assigned by the detector
    pub label: Option<CodeLabel>,
    /// Attestation applied to this chunk, if any
    pub attestation_id: Option<i64>,
    /// Label of the applied attestation
    pub attested_label: Option<CodeLabel>,
}

impl CodeChunk {
    /// The label that counts: an attestation wins over detection
    #[must_use]
    pub fn effective_label(&self) -> Option<CodeLabel> {
        self.attested_label.or(self.label)
    }

    /// Hash code content the way the analysis pipeline does
    #[must_use]
    pub fn hash_code(code: &str) -> String {
        let digest = Sha256::digest(code.trim().as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// A chunk to be inserted by the ingestion side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChunk {
    /// Owning file
    pub file_id: i64,
    /// Content hash
    pub code_hash: String,
    /// First line (1-indexed, inclusive)
    pub code_line_start: u32,
    /// Last line (1-indexed, inclusive)
    pub code_line_end: u32,
    /// Detected label
    pub label: Option<CodeLabel>,
}

/// Everything an attestation broadcast touched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttestedTargets {
    /// Chunks that now carry the attestation
    pub chunk_ids: Vec<i64>,
    /// Distinct files containing those chunks
    pub file_ids: Vec<i64>,
    /// Distinct commits containing those files
    pub commit_ids: Vec<i64>,
    /// Pull requests whose head commit is among those commits
    pub pull_request_ids: Vec<i64>,
}
