//! API request and response types
//!
//! All types are framework-agnostic and can be used by any client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiErrorData};
use crate::core::models::{
    AttestAction, CodeAttestation, CodeLabel, Composition, Feedback, FeedbackStatus, FeedbackVote,
};

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Standard API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorData>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create an error response
    #[must_use]
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiErrorData {
                code: code.to_string(),
                message: message.to_string(),
                fields: None,
            }),
        }
    }

    /// Create an error response carrying field details
    #[must_use]
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.into()),
        }
    }
}

/// Handler data paired with a non-200 success status
#[derive(Debug)]
pub struct WithStatus<T> {
    /// HTTP status
    pub status: u16,
    /// Response data
    pub data: T,
}

impl<T> WithStatus<T> {
    /// 200 OK
    pub const fn ok(data: T) -> Self {
        Self { status: 200, data }
    }

    /// 201 Created
    pub const fn created(data: T) -> Self {
        Self { status: 201, data }
    }

    /// 202 Accepted
    pub const fn accepted(data: T) -> Self {
        Self { status: 202, data }
    }
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request body for attesting code
#[derive(Debug, Default, Deserialize)]
pub struct AttestRequest {
    /// Content hash of the attested code
    #[serde(default)]
    pub code_hash: String,
    /// Label name (`ai`, `human`, `blended`, `not_evaluated`)
    #[serde(default)]
    pub label: String,
}

/// Request body for submitting feedback
#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    /// Who is giving feedback
    pub user: String,
    /// File the feedback is about
    pub file_path: String,
    /// First line
    pub code_line_start: u32,
    /// Last line
    pub code_line_end: u32,
    /// Thumbs up or down
    pub vote: FeedbackVote,
    /// Free-form comment
    #[serde(default)]
    pub comment: String,
}

/// Query parameters for listing feedback
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    /// Only this vote
    pub vote: Option<String>,
    /// Only this status
    pub status: Option<String>,
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// An attestation as returned by the API
#[derive(Debug, Serialize)]
pub struct AttestationData {
    /// Row id
    pub id: i64,
    /// Content hash
    pub code_hash: String,
    /// Attested label
    pub label: CodeLabel,
    /// Acting identity
    pub attested_by: String,
    /// When first created
    pub created_at: DateTime<Utc>,
    /// When last relabelled
    pub updated_at: DateTime<Utc>,
    /// Effective label before this attestation
    pub previous_label: Option<CodeLabel>,
    /// Agree/override classification
    pub action: AttestAction,
    /// Number of chunks now carrying the attestation
    pub chunks_attested: usize,
    /// Commits whose composition is being recalculated
    pub commits_affected: usize,
}

impl AttestationData {
    pub(super) fn new(
        attestation: CodeAttestation,
        previous_label: Option<CodeLabel>,
        action: AttestAction,
        chunks_attested: usize,
        commits_affected: usize,
    ) -> Self {
        Self {
            id: attestation.id,
            code_hash: attestation.code_hash,
            label: attestation.label,
            attested_by: attestation.attested_by,
            created_at: attestation.created_at,
            updated_at: attestation.updated_at,
            previous_label,
            action,
            chunks_attested,
            commits_affected,
        }
    }
}

/// Composition of a pull request's head commit
#[derive(Debug, Serialize)]
pub struct CompositionData {
    /// Provider-side PR number
    pub pr_number: i64,
    /// Head commit SHA
    pub head_commit_sha: String,
    /// Cached composition, absent until computed
    pub ai_composition: Option<Composition>,
    /// True while an attestation's effect has not been recomputed yet
    pub needs_composition_recalculation: bool,
}

/// Acknowledgement of a queued re-analysis
#[derive(Debug, Serialize)]
pub struct RerunData {
    /// Queue row id
    pub job_id: i64,
    /// Provider-side PR number
    pub pr_number: i64,
    /// Commit that will be analyzed
    pub head_commit_sha: String,
}

/// A feedback row as listed
#[derive(Debug, Serialize)]
pub struct FeedbackItem {
    /// Row id
    pub id: i64,
    /// Author
    pub user: String,
    /// File
    pub file_path: String,
    /// `start-end`
    pub lines: String,
    /// Review status
    pub status: FeedbackStatus,
    /// Vote
    pub vote: FeedbackVote,
    /// Comment, truncated for listing
    pub comment: String,
    /// When submitted
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackItem {
    fn from(f: Feedback) -> Self {
        Self {
            comment: f.comment_truncated(),
            id: f.id,
            lines: format!("{}-{}", f.code_line_start, f.code_line_end),
            user: f.user,
            file_path: f.file_path,
            status: f.status,
            vote: f.vote,
            created_at: f.created_at,
        }
    }
}

/// Feedback listing
#[derive(Debug, Serialize)]
pub struct FeedbackListData {
    /// Matching entries, newest first
    pub feedback: Vec<FeedbackItem>,
}
