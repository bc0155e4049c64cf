//! GitLab webhooks

use serde_json::Value;

use crate::core::models::{InboundWebhook, WebhookResponse};
use crate::core::services::{ProcessContext, WebhookProcessor};

use super::{id_at, schedule_analysis, str_at};

const ANALYZED_ACTIONS: &[&str] = &["open", "update", "reopen"];

/// Handles deliveries from a GitLab project hook
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabProcessor;

impl WebhookProcessor for GitLabProcessor {
    fn provider(&self) -> &'static str {
        "gitlab"
    }

    fn identifying_header(&self) -> &'static str {
        "X-Gitlab-Event-UUID"
    }

    fn integration(&self, request: &InboundWebhook) -> Option<String> {
        id_at(&request.payload, "/project/id")
    }

    fn process_post(
        &self,
        request: &InboundWebhook,
        ctx: &ProcessContext<'_>,
    ) -> anyhow::Result<WebhookResponse> {
        match str_at(&request.payload, "/object_kind") {
            Some("merge_request") => merge_request(&request.payload, ctx),
            _ => Ok(WebhookResponse::ok("ignored")),
        }
    }
}

fn merge_request(payload: &Value, ctx: &ProcessContext<'_>) -> anyhow::Result<WebhookResponse> {
    // Label-only edits arrive as "update" without a new commit; analysis is idempotent
    let action = str_at(payload, "/object_attributes/action").unwrap_or("open");
    if !ANALYZED_ACTIONS.contains(&action) {
        return Ok(WebhookResponse::ok("ignored"));
    }

    let (Some(full_name), Some(iid), Some(sha)) = (
        str_at(payload, "/project/path_with_namespace"),
        payload.pointer("/object_attributes/iid").and_then(Value::as_i64),
        str_at(payload, "/object_attributes/last_commit/id"),
    ) else {
        return Ok(WebhookResponse::new(400, "malformed merge_request payload"));
    };

    schedule_analysis(ctx, full_name, iid, sha)
}
