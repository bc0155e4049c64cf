//! AI composition of a commit
//!
//! Share of analyzed lines per effective label, as percentages.

use serde::{Deserialize, Serialize};

use super::CodeLabel;

/// Percentage breakdown of a commit's analyzed lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Percent of lines labelled AI
    pub ai: f64,
    /// Percent of lines labelled human
    pub human: f64,
    /// Percent of lines labelled blended
    pub blended: f64,
    /// Percent of lines with no usable label
    pub not_evaluated: f64,
    /// Lines considered
    pub total_lines: u64,
}

impl Composition {
    /// Build from `(effective label, line count)` pairs.
    ///
    /// Unlabelled chunks count as not evaluated.
    #[must_use]
    pub fn from_line_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (Option<CodeLabel>, u64)>,
    {
        let mut lines = [0u64; 4];
        for (label, count) in counts {
            let slot = match label.unwrap_or(CodeLabel::NotEvaluated) {
                CodeLabel::Ai => 0,
                CodeLabel::Human => 1,
                CodeLabel::Blended => 2,
                CodeLabel::NotEvaluated => 3,
            };
            lines[slot] += count;
        }

        let total: u64 = lines.iter().sum();
        let pct = |n: u64| {
            if total == 0 {
                0.0
            } else {
                #[allow(clippy::cast_precision_loss)]
                let raw = n as f64 * 100.0 / total as f64;
                (raw * 100.0).round() / 100.0
            }
        };

        Self {
            ai: pct(lines[0]),
            human: pct(lines[1]),
            blended: pct(lines[2]),
            not_evaluated: pct(lines[3]),
            total_lines: total,
        }
    }
}
