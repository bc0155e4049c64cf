//! Provider-specific webhook processors
//!
//! Each processor knows its provider's delivery header and payload shape.
//! Pull/merge request updates are turned into `analyze_pull_request` jobs.

mod github;
mod gitlab;

pub use github::GitHubProcessor;
pub use gitlab::GitLabProcessor;

use log::info;
use serde_json::Value;

use crate::core::models::{Job, WebhookResponse};
use crate::core::services::ProcessContext;

/// Processor for a provider slug as it appears in `/webhooks/{provider}`
#[must_use]
pub fn for_provider(slug: &str) -> Option<&'static dyn crate::core::services::WebhookProcessor> {
    match slug {
        "github" => Some(&GitHubProcessor),
        "gitlab" => Some(&GitLabProcessor),
        _ => None,
    }
}

/// Upsert the pull request head and enqueue its analysis
fn schedule_analysis(
    ctx: &ProcessContext<'_>,
    full_name: &str,
    pr_number: i64,
    head_commit_sha: &str,
) -> anyhow::Result<WebhookResponse> {
    let Some(repository) = ctx.code.repository_by_full_name(full_name)? else {
        info!("Ignoring webhook for unconnected repository {full_name}");
        return Ok(WebhookResponse::ok("repository not connected"));
    };

    let pr = ctx.code.upsert_pull_request(repository.id, pr_number, head_commit_sha)?;
    let job_id = ctx.jobs.enqueue(&Job::AnalyzePullRequest {
        repository_id: repository.id,
        pr_number: pr.pr_number,
        head_commit_sha: pr.head_commit_sha.clone(),
    })?;
    info!("Queued analysis job {job_id} for {full_name}#{pr_number} at {head_commit_sha}");

    Ok(WebhookResponse::new(202, "analysis scheduled"))
}

fn str_at<'a>(payload: &'a Value, pointer: &str) -> Option<&'a str> {
    payload.pointer(pointer).and_then(Value::as_str)
}

fn id_at(payload: &Value, pointer: &str) -> Option<String> {
    match payload.pointer(pointer)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
