//! Code attestation model
//!
//! A human-confirmed label for every chunk sharing a content hash.
//! There is at most one attestation per (repository, hash).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CodeLabel;

/// Longest content hash accepted (SHA-512 hex)
pub const MAX_CODE_HASH_LEN: usize = 128;

/// Canonical form of a content hash: trimmed, lowercase hex
#[must_use]
pub fn normalize_code_hash(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// A stored attestation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAttestation {
    /// Row id
    pub id: i64,
    /// Repository the attestation was made in
    pub repository_id: i64,
    /// Content hash of the attested code
    pub code_hash: String,
    /// The attested label
    pub label: CodeLabel,
    /// Identity of whoever attested
    pub attested_by: String,
    /// When first created
    pub created_at: DateTime<Utc>,
    /// When last relabelled
    pub updated_at: DateTime<Utc>,
}

/// Result of the find-or-create step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
    /// No attestation existed for the pair
    Created(CodeAttestation),
    /// An existing attestation was relabelled in place
    Updated(CodeAttestation),
}

impl Upserted {
    /// Whether a new row was inserted
    #[must_use]
    pub const fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// The attestation row, however it was produced
    #[must_use]
    pub const fn attestation(&self) -> &CodeAttestation {
        match self {
            Self::Created(a) | Self::Updated(a) => a,
        }
    }

    /// Take the attestation row
    #[must_use]
    pub fn into_attestation(self) -> CodeAttestation {
        match self {
            Self::Created(a) | Self::Updated(a) => a,
        }
    }
}

/// Unvalidated attestation input as it arrives from a caller
#[derive(Debug, Clone, Default)]
pub struct AttestationInput {
    /// Content hash
    pub code_hash: String,
    /// Label name
    pub label: String,
    /// Acting identity
    pub attested_by: String,
}

/// Validated attestation input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAttestation {
    /// Lowercased content hash
    pub code_hash: String,
    /// Parsed label
    pub label: CodeLabel,
    /// Acting identity
    pub attested_by: String,
}

/// Field-level validation failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid attestation: {}", summary(.fields))]
pub struct ValidationError {
    /// Messages keyed by field name
    pub fields: BTreeMap<String, Vec<String>>,
}

fn summary(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_default().push(message.into());
    }

    /// True when no field failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl AttestationInput {
    /// Check every field, collecting all failures
    pub fn validate(&self) -> Result<ValidAttestation, ValidationError> {
        let mut errors = ValidationError::default();

        let code_hash = normalize_code_hash(&self.code_hash);
        if code_hash.is_empty() {
            errors.add("code_hash", "This field may not be blank.");
        } else if code_hash.len() > MAX_CODE_HASH_LEN {
            errors.add(
                "code_hash",
                format!("Ensure this field has no more than {MAX_CODE_HASH_LEN} characters."),
            );
        } else if !code_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            errors.add("code_hash", "Must be a hexadecimal digest.");
        }

        let label = match self.label.parse::<CodeLabel>() {
            Ok(label) => Some(label),
            Err(_) => {
                errors.add("label", format!("\"{}\" is not a valid choice.", self.label));
                None
            },
        };

        let attested_by = self.attested_by.trim().to_string();
        if attested_by.is_empty() {
            errors.add("attested_by", "This field may not be blank.");
        }

        match label {
            Some(label) if errors.is_empty() => Ok(ValidAttestation {
                code_hash,
                label,
                attested_by,
            }),
            _ => Err(errors),
        }
    }
}
