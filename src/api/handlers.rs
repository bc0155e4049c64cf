//! Pure API handlers
//!
//! These handlers contain business logic and are HTTP-agnostic.
//! They take an [`App`] plus typed input and return `Result<T, ApiError>`.

use log::info;

use crate::app::App;
use crate::core::models::{
    AttestationInput, FeedbackFilter, FeedbackStatus, FeedbackVote, InboundWebhook, Job,
    NewFeedback, PullRequest, Repository, WebhookResponse,
};
use crate::core::ports::{CodeRepository, CompositionStore, FeedbackRepository, JobQueue};
use crate::providers;

use super::error::ApiError;
use super::types::{
    AttestRequest, AttestationData, CompositionData, CreateFeedbackRequest, FeedbackItem,
    FeedbackListData, FeedbackQuery, RerunData, WithStatus,
};

/// Header naming the acting identity on attestation requests
pub const ATTESTED_BY_HEADER: &str = "X-Attested-By";

// =============================================================================
// ATTESTATIONS
// =============================================================================

/// Attest every chunk sharing a hash in the repository's organization
///
/// 201 when the attestation is new, 200 when an existing one was relabelled.
pub fn record_attestation(
    app: &App,
    public_id: &str,
    attested_by: Option<&str>,
    req: &AttestRequest,
) -> Result<WithStatus<AttestationData>, ApiError> {
    let attested_by = attested_by
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::unauthorized(format!("{ATTESTED_BY_HEADER} header is required")))?;

    let repository = find_repository(app, public_id)?;

    let input = AttestationInput {
        code_hash: req.code_hash.clone(),
        label: req.label.clone(),
        attested_by: attested_by.to_string(),
    };
    let outcome = app.recorder().record(&repository, &input)?;

    let data = AttestationData::new(
        outcome.attestation,
        outcome.previous_label,
        outcome.action,
        outcome.targets.chunk_ids.len(),
        outcome.targets.commit_ids.len(),
    );
    Ok(if outcome.created {
        WithStatus::created(data)
    } else {
        WithStatus::ok(data)
    })
}

// =============================================================================
// PULL REQUESTS
// =============================================================================

/// Composition of a pull request's head commit
pub fn pull_request_composition(
    app: &App,
    public_id: &str,
    pr_number: i64,
) -> Result<CompositionData, ApiError> {
    let repository = find_repository(app, public_id)?;
    let pr = find_pull_request(app, &repository, pr_number)?;

    let commit = app.store.commit_by_sha(repository.id, &pr.head_commit_sha)?;
    let (ai_composition, needs_composition_recalculation) =
        commit.map_or((None, false), |c| (c.ai_composition, c.needs_composition_recalculation));

    Ok(CompositionData {
        pr_number: pr.pr_number,
        head_commit_sha: pr.head_commit_sha,
        ai_composition,
        needs_composition_recalculation,
    })
}

/// Queue a fresh analysis of a pull request's head commit
pub fn rerun_analysis(
    app: &App,
    public_id: &str,
    pr_number: i64,
) -> Result<WithStatus<RerunData>, ApiError> {
    let repository = find_repository(app, public_id)?;
    let pr = find_pull_request(app, &repository, pr_number)?;

    let job_id = app.store.enqueue(&Job::AnalyzePullRequest {
        repository_id: repository.id,
        pr_number: pr.pr_number,
        head_commit_sha: pr.head_commit_sha.clone(),
    })?;
    info!("Queued re-analysis job {job_id} for {}#{}", repository.full_name, pr.pr_number);

    Ok(WithStatus::accepted(RerunData {
        job_id,
        pr_number: pr.pr_number,
        head_commit_sha: pr.head_commit_sha,
    }))
}

// =============================================================================
// FEEDBACK
// =============================================================================

/// Submit feedback on a detection
pub fn create_feedback(
    app: &App,
    req: &CreateFeedbackRequest,
) -> Result<WithStatus<FeedbackItem>, ApiError> {
    if req.user.trim().is_empty() {
        return Err(ApiError::bad_request("Feedback user cannot be empty"));
    }
    if req.file_path.trim().is_empty() {
        return Err(ApiError::bad_request("Feedback file_path cannot be empty"));
    }
    if req.code_line_start == 0 || req.code_line_end < req.code_line_start {
        return Err(ApiError::bad_request(
            "Line range must start at 1 and end at or after its start",
        ));
    }

    let feedback = app.store.create(&NewFeedback {
        user: req.user.trim().to_string(),
        file_path: req.file_path.clone(),
        code_line_start: req.code_line_start,
        code_line_end: req.code_line_end,
        vote: req.vote,
        comment: req.comment.clone(),
    })?;

    Ok(WithStatus::created(feedback.into()))
}

/// List feedback, newest first
pub fn list_feedback(app: &App, query: &FeedbackQuery) -> Result<FeedbackListData, ApiError> {
    let filter = FeedbackFilter {
        vote: query
            .vote
            .as_deref()
            .map(str::parse::<FeedbackVote>)
            .transpose()
            .map_err(ApiError::bad_request)?,
        status: query
            .status
            .as_deref()
            .map(str::parse::<FeedbackStatus>)
            .transpose()
            .map_err(ApiError::bad_request)?,
    };

    let feedback = app.store.list(filter)?;
    Ok(FeedbackListData {
        feedback: feedback.into_iter().map(FeedbackItem::from).collect(),
    })
}

// =============================================================================
// WEBHOOKS
// =============================================================================

/// Store and process a provider webhook
pub fn receive_webhook(
    app: &App,
    provider: &str,
    request: &InboundWebhook,
) -> Result<WebhookResponse, ApiError> {
    let processor = providers::for_provider(provider)
        .ok_or_else(|| ApiError::not_found(format!("Unknown webhook provider '{provider}'")))?;

    let dispatched = app.dispatcher().dispatch(processor, &app.process_context(), request);
    Ok(dispatched.response)
}

// =============================================================================
// HELPERS
// =============================================================================

fn find_repository(app: &App, public_id: &str) -> Result<Repository, ApiError> {
    app.store
        .repository_by_public_id(public_id)?
        .ok_or_else(|| ApiError::not_found(format!("Repository '{public_id}' not found")))
}

fn find_pull_request(
    app: &App,
    repository: &Repository,
    pr_number: i64,
) -> Result<PullRequest, ApiError> {
    app.store.pull_request(repository.id, pr_number)?.ok_or_else(|| {
        ApiError::not_found(format!(
            "Pull request #{pr_number} not found in {}",
            repository.full_name
        ))
    })
}
