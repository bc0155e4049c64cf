//! Tests for API error types and HTTP routing
//!
//! Routing is exercised through `server::route`, which needs no socket.

use codeattest::app::App;
use codeattest::core::models::CodeLabel;
use codeattest::core::ports::CodeRepository;
use codeattest::server::{RawRequest, route};
use serde_json::json;

use crate::common::fixtures::{World, hash};

// =============================================================================
// ERROR TYPES
// =============================================================================

mod error_tests {
    use codeattest::api::{ApiError, ApiResponse, ErrorCode};

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::internal("x").status_code(), 500);
        assert_eq!(ErrorCode::Unauthorized.as_str(), "UNAUTHORIZED");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::not_found("Resource missing");
        let display = format!("{err}");
        assert!(display.contains("NOT_FOUND"));
        assert!(display.contains("Resource missing"));
    }

    #[test]
    fn test_error_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::<()>::from_error(&ApiError::not_found("gone")))
            .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"].get("fields").is_none());
        assert!(body.get("data").is_none());
    }
}

// =============================================================================
// ROUTING
// =============================================================================

fn attest_request(body: serde_json::Value) -> RawRequest {
    RawRequest::new("POST", "/api/repositories/repo-acme-api/attestations", body.to_string())
        .header("X-Attested-By", "dev@acme.test")
}

fn seeded() -> (World, App) {
    let world = World::new();
    let app = world.app();
    (world, app)
}

#[test]
fn test_attestation_created_then_ok() {
    let (_world, app) = seeded();
    let body = json!({"code_hash": hash("x"), "label": "ai"});

    let first = route(&app, &attest_request(body.clone()));
    assert_eq!(first.status, 201);
    assert_eq!(first.content_type, "application/json");
    let json = first.json().unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["label"], "ai");
    assert_eq!(json["data"]["attested_by"], "dev@acme.test");

    assert_eq!(route(&app, &attest_request(body)).status, 200);
}

#[test]
fn test_attestation_validation_returns_field_map() {
    let (_world, app) = seeded();
    let reply = route(&app, &attest_request(json!({"code_hash": "", "label": "robot"})));

    assert_eq!(reply.status, 400);
    let json = reply.json().unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"]["fields"]["code_hash"].is_array());
    assert!(json["error"]["fields"]["label"].is_array());
}

#[test]
fn test_attestation_requires_identity_header() {
    let (_world, app) = seeded();
    let request = RawRequest::new(
        "POST",
        "/api/repositories/repo-acme-api/attestations",
        json!({"code_hash": hash("x"), "label": "ai"}).to_string(),
    );
    assert_eq!(route(&app, &request).status, 401);
}

#[test]
fn test_attestation_rejects_malformed_json() {
    let (_world, app) = seeded();
    let request = RawRequest::new("POST", "/api/repositories/repo-acme-api/attestations", "{nope")
        .header("X-Attested-By", "dev");
    assert_eq!(route(&app, &request).status, 400);
}

#[test]
fn test_composition_endpoint_reports_flag() {
    let (world, app) = seeded();
    let h = hash("pr code");
    let commit = world.commit(&world.repo, "head1");
    let file = world.file(&commit, "a.rs");
    world.chunk(&file, &h, (1, 4), Some(CodeLabel::Ai));
    world.store.upsert_pull_request(world.repo.id, 9, "head1").unwrap();

    route(&app, &attest_request(json!({"code_hash": h, "label": "human"})));

    let reply = route(
        &app,
        &RawRequest::new("GET", "/api/repositories/repo-acme-api/pull-requests/9/composition", ""),
    );
    assert_eq!(reply.status, 200);
    let json = reply.json().unwrap();
    assert_eq!(json["data"]["needs_composition_recalculation"], false);
    assert_eq!(json["data"]["ai_composition"]["human"], 100.0);
    assert_eq!(json["data"]["head_commit_sha"], "head1");
}

#[test]
fn test_composition_of_unknown_pull_request_is_404() {
    let (_world, app) = seeded();
    let reply = route(
        &app,
        &RawRequest::new("GET", "/api/repositories/repo-acme-api/pull-requests/5/composition", ""),
    );
    assert_eq!(reply.status, 404);

    let reply = route(
        &app,
        &RawRequest::new("GET", "/api/repositories/repo-acme-api/pull-requests/x/composition", ""),
    );
    assert_eq!(reply.status, 400);
}

#[test]
fn test_rerun_analysis_is_accepted() {
    let (world, app) = seeded();
    world.store.upsert_pull_request(world.repo.id, 4, "abc").unwrap();

    let reply = route(
        &app,
        &RawRequest::new("POST", "/api/repositories/repo-acme-api/pull-requests/4/rerun-analysis", ""),
    );
    assert_eq!(reply.status, 202);
    let json = reply.json().unwrap();
    assert_eq!(json["data"]["pr_number"], 4);
    assert_eq!(json["data"]["head_commit_sha"], "abc");
}

#[test]
fn test_webhook_route_dispatches_to_provider() {
    let (world, app) = seeded();
    let request = RawRequest::new("POST", "/webhooks/github", json!({"zen": "hi"}).to_string())
        .header("X-GitHub-Event", "ping")
        .header("X-GitHub-Delivery", "route-1");

    let reply = route(&app, &request);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "pong");
    assert!(world.webhook_dir().exists());

    let replay = route(&app, &request);
    assert_eq!(replay.body, "already processed");
}

#[test]
fn test_webhook_get_is_not_allowed() {
    let (_world, app) = seeded();
    let reply = route(&app, &RawRequest::new("GET", "/webhooks/gitlab", ""));
    assert_eq!(reply.status, 405);
}

#[test]
fn test_unknown_provider_and_route_are_404() {
    let (_world, app) = seeded();
    assert_eq!(route(&app, &RawRequest::new("POST", "/webhooks/bitbucket", "{}")).status, 404);

    let reply = route(&app, &RawRequest::new("DELETE", "/api/feedback", ""));
    assert_eq!(reply.status, 404);
    assert_eq!(reply.json().unwrap()["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// FEEDBACK
// =============================================================================

fn feedback(user: &str, vote: &str, comment: &str) -> RawRequest {
    RawRequest::new(
        "POST",
        "/api/feedback",
        json!({
            "user": user,
            "file_path": "src/lib.rs",
            "code_line_start": 3,
            "code_line_end": 9,
            "vote": vote,
            "comment": comment,
        })
        .to_string(),
    )
}

#[test]
fn test_feedback_create_and_filtered_list() {
    let (_world, app) = seeded();
    let long = "The detector flagged this hand-written parser as AI generated code again";

    let created = route(&app, &feedback("ana", "down", long));
    assert_eq!(created.status, 201);
    let json = created.json().unwrap();
    assert_eq!(json["data"]["status"], "open");
    assert_eq!(json["data"]["lines"], "3-9");
    assert!(json["data"]["comment"].as_str().unwrap().ends_with("..."));

    assert_eq!(route(&app, &feedback("bo", "up", "spot on")).status, 201);

    let all = route(&app, &RawRequest::new("GET", "/api/feedback", "")).json().unwrap();
    assert_eq!(all["data"]["feedback"].as_array().unwrap().len(), 2);
    assert_eq!(all["data"]["feedback"][0]["user"], "bo");

    let down = route(&app, &RawRequest::new("GET", "/api/feedback?vote=down", "")).json().unwrap();
    let down = down["data"]["feedback"].as_array().unwrap().clone();
    assert_eq!(down.len(), 1);
    assert_eq!(down[0]["user"], "ana");

    let resolved = route(&app, &RawRequest::new("GET", "/api/feedback?status=resolved", ""))
        .json()
        .unwrap();
    assert!(resolved["data"]["feedback"].as_array().unwrap().is_empty());
}

#[test]
fn test_feedback_rejects_bad_input() {
    let (_world, app) = seeded();
    assert_eq!(route(&app, &feedback("", "up", "")).status, 400);
    assert_eq!(route(&app, &feedback("ana", "sideways", "")).status, 400);
    assert_eq!(route(&app, &RawRequest::new("GET", "/api/feedback?vote=sideways", "")).status, 400);
}
