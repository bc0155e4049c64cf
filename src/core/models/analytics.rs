//! Analytics events emitted by the attestation flow

use serde::Serialize;
use serde_json::json;

use super::CodeLabel;

/// How a new attestation relates to the label chunks already carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestAction {
    /// The attested label matches the previous one
    Agree,
    /// The attested label differs, or there was none
    Override,
}

impl AttestAction {
    /// Classify a relabel; an absent previous label is always an override
    #[must_use]
    pub fn classify(previous: Option<CodeLabel>, attested: CodeLabel) -> Self {
        if previous == Some(attested) {
            Self::Agree
        } else {
            Self::Override
        }
    }

    /// Event name sent to the analytics pipeline
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Agree => "attest_agree",
            Self::Override => "attest_override",
        }
    }
}

/// A single analytics event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    /// Identity the event is keyed by
    pub distinct_id: String,
    /// Event name
    pub event: String,
    /// Free-form properties
    pub properties: serde_json::Value,
}

impl AnalyticsEvent {
    /// Build the event describing an attestation
    #[must_use]
    pub fn attestation(
        distinct_id: &str,
        action: AttestAction,
        code_hash: &str,
        previous_label: Option<CodeLabel>,
        attest_label: CodeLabel,
    ) -> Self {
        Self {
            distinct_id: distinct_id.to_string(),
            event: action.event_name().to_string(),
            properties: json!({
                "code_hash": code_hash,
                "previous_label": previous_label,
                "attest_label": attest_label,
            }),
        }
    }
}
