//! GenAI detection feedback
//!
//! Users vote on whether a detected region was labelled correctly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length a comment is cut to in listings
pub const COMMENT_TRUNCATE_LEN: usize = 50;

/// Thumbs up or down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackVote {
    /// Detection was right
    Up,
    /// Detection was wrong
    Down,
}

/// Triage state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    /// Not looked at yet
    #[default]
    Open,
    /// Seen by the team
    Reviewed,
    /// Acted upon
    Resolved,
}

macro_rules! lowercase_enum_str {
    ($ty:ty, $($variant:ident => $s:literal),+ $(,)?) => {
        impl $ty {
            /// Stable string form
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($s => Ok(Self::$variant),)+
                    _ => Err(format!(
                        "Invalid value: {s}. Use: {}",
                        [$($s),+].join(", ")
                    )),
                }
            }
        }
    };
}

lowercase_enum_str!(FeedbackVote, Up => "up", Down => "down");
lowercase_enum_str!(
    FeedbackStatus,
    Open => "open",
    Reviewed => "reviewed",
    Resolved => "resolved",
);

/// A feedback entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Row id
    pub id: i64,
    /// Who gave the feedback
    pub user: String,
    /// File the feedback is about
    pub file_path: String,
    /// First line of the region
    pub code_line_start: u32,
    /// Last line of the region
    pub code_line_end: u32,
    /// Triage state
    pub status: FeedbackStatus,
    /// The vote
    pub vote: FeedbackVote,
    /// Free-text comment
    pub comment: String,
    /// When submitted
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Comment cut to [`COMMENT_TRUNCATE_LEN`] characters with an ellipsis
    #[must_use]
    pub fn comment_truncated(&self) -> String {
        if self.comment.chars().count() <= COMMENT_TRUNCATE_LEN {
            return self.comment.clone();
        }
        let cut: String = self.comment.chars().take(COMMENT_TRUNCATE_LEN).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Fields needed to insert feedback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    /// Who gave the feedback
    pub user: String,
    /// File the feedback is about
    pub file_path: String,
    /// First line
    pub code_line_start: u32,
    /// Last line
    pub code_line_end: u32,
    /// The vote
    pub vote: FeedbackVote,
    /// Comment
    pub comment: String,
}

/// Listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    /// Only this vote
    pub vote: Option<FeedbackVote>,
    /// Only this status
    pub status: Option<FeedbackStatus>,
}
