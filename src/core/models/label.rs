//! Code generation labels
//!
//! The label a detector or a human assigns to a chunk of code.

use serde::{Deserialize, Serialize};

/// How a chunk of code was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeLabel {
    /// Generated by an AI assistant
    Ai,
    /// Written by a human
    Human,
    /// AI output edited by a human (or the reverse)
    Blended,
    /// The detector could not decide
    NotEvaluated,
}

impl CodeLabel {
    /// All labels, in composition order
    pub const ALL: [Self; 4] = [Self::Ai, Self::Human, Self::Blended, Self::NotEvaluated];

    /// Stable string form used in storage and on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Human => "human",
            Self::Blended => "blended",
            Self::NotEvaluated => "not_evaluated",
        }
    }
}

impl std::fmt::Display for CodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CodeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ai" => Ok(Self::Ai),
            "human" => Ok(Self::Human),
            "blended" => Ok(Self::Blended),
            "not_evaluated" | "not-evaluated" => Ok(Self::NotEvaluated),
            _ => Err(format!("Invalid label: {s}. Use: ai, human, blended, not_evaluated")),
        }
    }
}
