//! GitHub webhooks

use serde_json::Value;

use crate::core::models::{InboundWebhook, WebhookResponse};
use crate::core::services::{ProcessContext, WebhookProcessor};

use super::{id_at, schedule_analysis, str_at};

const EVENT_HEADER: &str = "X-GitHub-Event";

/// Pull request actions that change what needs analyzing
const ANALYZED_ACTIONS: &[&str] = &["opened", "synchronize", "reopened"];

/// Handles deliveries from a GitHub App installation
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubProcessor;

impl WebhookProcessor for GitHubProcessor {
    fn provider(&self) -> &'static str {
        "github"
    }

    fn identifying_header(&self) -> &'static str {
        "X-GitHub-Delivery"
    }

    fn integration(&self, request: &InboundWebhook) -> Option<String> {
        id_at(&request.payload, "/installation/id")
    }

    fn process_post(
        &self,
        request: &InboundWebhook,
        ctx: &ProcessContext<'_>,
    ) -> anyhow::Result<WebhookResponse> {
        match request.header(EVENT_HEADER) {
            Some("ping") => Ok(WebhookResponse::ok("pong")),
            Some("pull_request") => pull_request(&request.payload, ctx),
            _ => Ok(WebhookResponse::ok("ignored")),
        }
    }
}

fn pull_request(payload: &Value, ctx: &ProcessContext<'_>) -> anyhow::Result<WebhookResponse> {
    let action = str_at(payload, "/action").unwrap_or_default();
    if !ANALYZED_ACTIONS.contains(&action) {
        return Ok(WebhookResponse::ok("ignored"));
    }

    let (Some(full_name), Some(number), Some(sha)) = (
        str_at(payload, "/repository/full_name"),
        payload.pointer("/pull_request/number").and_then(Value::as_i64),
        str_at(payload, "/pull_request/head/sha"),
    ) else {
        return Ok(WebhookResponse::new(400, "malformed pull_request payload"));
    };

    schedule_analysis(ctx, full_name, number, sha)
}
