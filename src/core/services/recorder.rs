//! Attestation recorder
//!
//! Upserts the (repository, hash) attestation and broadcasts its label to
//! every chunk in the organization that shares the hash.

use log::{debug, info, warn};
use thiserror::Error;

use crate::core::models::{
    AnalyticsEvent, AttestAction, AttestationInput, AttestedTargets, CodeAttestation, CodeChunk,
    CodeLabel, Repository, ValidationError,
};
use crate::core::ports::{AnalyticsSink, CodeRepository, RecalculationScheduler};

/// Why an attestation could not be recorded
#[derive(Debug, Error)]
pub enum RecordError {
    /// Input failed validation; nothing was persisted
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The datastore failed
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// What recording an attestation did
#[derive(Debug, Clone)]
pub struct AttestationOutcome {
    /// The attestation row after the upsert
    pub attestation: CodeAttestation,
    /// Whether the row was created (as opposed to relabelled)
    pub created: bool,
    /// Effective label of the first matching chunk before the change
    pub previous_label: Option<CodeLabel>,
    /// Agree/override classification sent to analytics
    pub action: AttestAction,
    /// Rows reached by the broadcast
    pub targets: AttestedTargets,
}

/// Records attestations against a datastore
#[derive(Clone, Copy)]
pub struct AttestationRecorder<'a> {
    code: &'a dyn CodeRepository,
    analytics: &'a dyn AnalyticsSink,
    scheduler: &'a dyn RecalculationScheduler,
}

impl std::fmt::Debug for AttestationRecorder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationRecorder").finish_non_exhaustive()
    }
}

impl<'a> AttestationRecorder<'a> {
    /// Create a recorder over the given ports
    #[must_use]
    pub fn new(
        code: &'a dyn CodeRepository,
        analytics: &'a dyn AnalyticsSink,
        scheduler: &'a dyn RecalculationScheduler,
    ) -> Self {
        Self {
            code,
            analytics,
            scheduler,
        }
    }

    /// Record an attestation and broadcast it.
    ///
    /// Analytics and scheduling failures are logged and do not fail the call:
    /// by then the attestation is already stored.
    pub fn record(
        &self,
        repository: &Repository,
        input: &AttestationInput,
    ) -> Result<AttestationOutcome, RecordError> {
        let valid = input.validate()?;

        // previous label is read before the upsert relabels attested chunks
        let chunks = self.code.chunks_with_hash(repository.organization_id, &valid.code_hash)?;
        let previous_label = chunks.first().and_then(CodeChunk::effective_label);
        let action = AttestAction::classify(previous_label, valid.label);

        let upserted = self.code.upsert_attestation(repository, &valid)?;
        let created = upserted.created();
        let attestation = upserted.into_attestation();

        let event = AnalyticsEvent::attestation(
            &valid.attested_by,
            action,
            &valid.code_hash,
            previous_label,
            valid.label,
        );
        if let Err(e) = self.analytics.capture(&event) {
            warn!("Failed to send {} event: {e:#}", event.event);
        }

        if chunks.is_empty() {
            debug!(
                "No chunks carry hash {} yet; attestation {} waits for ingestion",
                valid.code_hash, attestation.id
            );
            return Ok(AttestationOutcome {
                attestation,
                created,
                previous_label,
                action,
                targets: AttestedTargets::default(),
            });
        }

        let chunk_ids: Vec<i64> = chunks.iter().map(|c| c.id).collect();
        let targets =
            self.code.assign_attestation(attestation.id, &chunk_ids, attestation.updated_at)?;

        info!(
            "Attested {} as {} ({}): {} chunk(s), {} file(s), {} commit(s), {} PR(s)",
            valid.code_hash,
            valid.label,
            action.event_name(),
            targets.chunk_ids.len(),
            targets.file_ids.len(),
            targets.commit_ids.len(),
            targets.pull_request_ids.len()
        );

        self.code.mark_needs_recalculation(&targets.commit_ids)?;
        if let Err(e) = self.scheduler.schedule(&targets.commit_ids) {
            warn!("Failed to schedule composition recalculation: {e:#}");
        }

        Ok(AttestationOutcome {
            attestation,
            created,
            previous_label,
            action,
            targets,
        })
    }
}
