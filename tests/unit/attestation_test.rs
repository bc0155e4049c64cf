//! Tests for recording and broadcasting attestations

use std::sync::Arc;

use codeattest::adapters::SqliteStore;
use codeattest::api::{self, AttestRequest, ErrorCode};
use codeattest::core::models::{AttestAction, AttestationInput, CodeLabel, NewChunk, Upserted};
use codeattest::core::ports::{CodeRepository, CompositionStore};
use codeattest::core::services::{AttestationRecorder, RecordError};

use crate::common::fixtures::{World, hash};
use crate::common::mocks::{RecordingAnalytics, RecordingScheduler};

fn attest(hash: &str, label: &str) -> AttestRequest {
    AttestRequest {
        code_hash: hash.to_string(),
        label: label.to_string(),
    }
}

fn input(hash: &str, label: &str) -> AttestationInput {
    AttestationInput {
        code_hash: hash.to_string(),
        label: label.to_string(),
        attested_by: "dev@acme.test".to_string(),
    }
}

// =============================================================================
// UPSERT
// =============================================================================

#[test]
fn test_first_attestation_is_created_then_updated_in_place() {
    let world = World::new();
    let app = world.app();
    let h = hash("fn main() {}");

    let first = api::record_attestation(&app, "repo-acme-api", Some("dev@acme.test"), &attest(&h, "ai"))
        .unwrap();
    assert_eq!(first.status, 201);
    assert_eq!(first.data.label, CodeLabel::Ai);

    let second =
        api::record_attestation(&app, "repo-acme-api", Some("lead@acme.test"), &attest(&h, "human"))
            .unwrap();
    assert_eq!(second.status, 200);
    assert_eq!(second.data.id, first.data.id);
    assert_eq!(second.data.label, CodeLabel::Human);
    assert_eq!(second.data.attested_by, "lead@acme.test");
    assert!(second.data.updated_at >= first.data.updated_at);

    assert_eq!(world.store.attestation_count(world.repo.id, &h).unwrap(), 1);
}

#[test]
fn test_uppercase_hash_is_stored_lowercase() {
    let world = World::new();
    let app = world.app();
    let h = hash("let x = 1;");

    api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h.to_uppercase(), "ai"))
        .unwrap();

    assert!(world.store.attestation(world.repo.id, &h).unwrap().is_some());
}

#[test]
fn test_upsert_from_another_connection_relabels_in_place() {
    let world = World::new();
    let other = SqliteStore::open(world.dir.path().join("codeattest.db")).unwrap();
    let h = hash("shared across processes");

    let first = world
        .store
        .upsert_attestation(&world.repo, &input(&h, "ai").validate().unwrap())
        .unwrap();
    let second = other
        .upsert_attestation(&world.repo, &input(&h, "human").validate().unwrap())
        .unwrap();

    assert!(matches!(first, Upserted::Created(_)));
    assert!(matches!(second, Upserted::Updated(_)));
    assert_eq!(second.attestation().id, first.attestation().id);
    assert_eq!(second.attestation().created_at, first.attestation().created_at);
    assert_eq!(second.attestation().label, CodeLabel::Human);
    assert_eq!(world.store.attestation_count(world.repo.id, &h).unwrap(), 1);
}

// =============================================================================
// INGESTION
// =============================================================================

#[test]
fn test_uppercase_chunk_hash_is_reached_by_broadcast() {
    let world = World::new();
    let h = hash("mixed case ingest");
    let commit = world.commit(&world.repo, "c1");
    let file = world.file(&commit, "a.rs");
    let chunk = world.chunk(&file, &h.to_uppercase(), (1, 3), Some(CodeLabel::Ai));
    assert_eq!(chunk.code_hash, h);

    let reply =
        api::record_attestation(&world.app(), "repo-acme-api", Some("dev"), &attest(&h, "human"))
            .unwrap();

    assert_eq!(reply.data.chunks_attested, 1);
    let chunk = world.store.chunk(chunk.id).unwrap().unwrap();
    assert_eq!(chunk.attestation_id, Some(reply.data.id));
    assert_eq!(chunk.effective_label(), Some(CodeLabel::Human));
}

#[test]
fn test_reversed_chunk_range_is_rejected() {
    let world = World::new();
    let commit = world.commit(&world.repo, "c1");
    let file = world.file(&commit, "a.rs");

    for (start, end) in [(5, 4), (0, 3)] {
        let err = world
            .store
            .insert_chunk(&NewChunk {
                file_id: file.id,
                code_hash: hash("backwards"),
                code_line_start: start,
                code_line_end: end,
                label: None,
            })
            .unwrap_err();
        assert!(err.to_string().contains("invalid chunk line range"));
    }
    assert!(world.store.commit_line_counts(commit.id).unwrap().is_empty());
}

// =============================================================================
// VALIDATION AND LOOKUP ERRORS
// =============================================================================

#[test]
fn test_invalid_input_reports_fields_and_persists_nothing() {
    let world = World::new();
    let app = world.app();

    let err = api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest("xyz!", "robot"))
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BadRequest);
    let fields = err.fields.unwrap();
    assert!(fields.contains_key("code_hash"));
    assert!(fields.contains_key("label"));
    assert_eq!(world.store.attestation_count(world.repo.id, "xyz!").unwrap(), 0);
}

#[test]
fn test_overlong_hash_is_rejected() {
    let world = World::new();
    let app = world.app();
    let long = "a".repeat(129);

    let err =
        api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&long, "ai")).unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_missing_identity_is_unauthorized() {
    let world = World::new();
    let app = world.app();
    let h = hash("x");

    let err = api::record_attestation(&app, "repo-acme-api", None, &attest(&h, "ai")).unwrap_err();
    assert_eq!(err.status_code(), 401);

    let err =
        api::record_attestation(&app, "repo-acme-api", Some("  "), &attest(&h, "ai")).unwrap_err();
    assert_eq!(err.status_code(), 401);
    assert_eq!(world.store.attestation_count(world.repo.id, &h).unwrap(), 0);
}

#[test]
fn test_unknown_repository_is_not_found() {
    let world = World::new();
    let app = world.app();

    let err =
        api::record_attestation(&app, "nope", Some("dev"), &attest(&hash("x"), "ai")).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

// =============================================================================
// BROADCAST
// =============================================================================

#[test]
fn test_broadcast_reaches_every_repository_in_the_organization() {
    let world = World::new();
    let h = hash("shared helper");
    let sibling = world.sibling_repo("repo-acme-web", "acme/web");
    let foreign = world.foreign_repo("repo-globex", "globex/app");

    let c1 = world.commit(&world.repo, "aaa111");
    let f1 = world.file(&c1, "src/lib.rs");
    let k1 = world.chunk(&f1, &h, (1, 10), Some(CodeLabel::Ai));

    let c2 = world.commit(&sibling, "bbb222");
    let f2 = world.file(&c2, "web/util.ts");
    let k2 = world.chunk(&f2, &h, (5, 9), Some(CodeLabel::Ai));

    let c3 = world.commit(&foreign, "ccc333");
    let f3 = world.file(&c3, "main.py");
    let k3 = world.chunk(&f3, &h, (1, 3), Some(CodeLabel::Ai));

    let app = world.app();
    let reply =
        api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, "human")).unwrap();
    assert_eq!(reply.data.chunks_attested, 2);
    assert_eq!(reply.data.commits_affected, 2);

    let attestation_id = Some(reply.data.id);
    assert_eq!(world.store.chunk(k1.id).unwrap().unwrap().attestation_id, attestation_id);
    assert_eq!(world.store.chunk(k2.id).unwrap().unwrap().attestation_id, attestation_id);
    assert_eq!(
        world.store.chunk(k2.id).unwrap().unwrap().effective_label(),
        Some(CodeLabel::Human)
    );

    let untouched = world.store.chunk(k3.id).unwrap().unwrap();
    assert_eq!(untouched.attestation_id, None);
    assert_eq!(untouched.effective_label(), Some(CodeLabel::Ai));
    assert!(world.store.file(f3.id).unwrap().unwrap().last_attested_at.is_none());
}

#[test]
fn test_last_attested_at_cascades_to_file_commit_and_pull_request() {
    let world = World::new();
    let h = hash("cascade");
    let commit = world.commit(&world.repo, "head123");
    let file = world.file(&commit, "src/a.rs");
    world.chunk(&file, &h, (1, 4), None);
    let other_file = world.file(&commit, "src/b.rs");
    world.store.upsert_pull_request(world.repo.id, 7, "head123").unwrap();
    world.store.upsert_pull_request(world.repo.id, 8, "elsewhere").unwrap();

    let app = world.app();
    let reply = api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, "ai")).unwrap();
    let at = reply.data.updated_at;

    assert_eq!(world.store.file(file.id).unwrap().unwrap().last_attested_at, Some(at));
    assert_eq!(world.store.commit(commit.id).unwrap().unwrap().last_attested_at, Some(at));
    assert_eq!(
        world.store.pull_request(world.repo.id, 7).unwrap().unwrap().last_attested_at,
        Some(at)
    );
    assert!(world.store.pull_request(world.repo.id, 8).unwrap().unwrap().last_attested_at.is_none());
    assert!(world.store.file(other_file.id).unwrap().unwrap().last_attested_at.is_none());
}

#[test]
fn test_zero_matching_chunks_keeps_row_for_later_ingestion() {
    let world = World::new();
    let h = hash("not yet ingested");
    let scheduler = Arc::new(RecordingScheduler::default());
    let (app, analytics, _) = world.recording_app();
    let app = app.with_scheduler(scheduler.clone());

    let reply = api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, "human")).unwrap();
    assert_eq!(reply.status, 201);
    assert_eq!(reply.data.chunks_attested, 0);
    assert!(scheduler.scheduled().is_empty());

    let events = analytics.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "attest_override");
    assert!(events[0].properties["previous_label"].is_null());

    let commit = world.commit(&world.repo, "later");
    let file = world.file(&commit, "src/late.rs");
    let chunk = world.chunk(&file, &h, (1, 2), Some(CodeLabel::Ai));
    assert_eq!(chunk.attestation_id, Some(reply.data.id));
    assert_eq!(chunk.effective_label(), Some(CodeLabel::Human));
}

// =============================================================================
// ANALYTICS
// =============================================================================

#[test]
fn test_agree_and_override_events() {
    let world = World::new();
    let h = hash("classified");
    let commit = world.commit(&world.repo, "c1");
    let file = world.file(&commit, "a.rs");
    world.chunk(&file, &h, (1, 1), Some(CodeLabel::Ai));
    world.chunk(&file, &h, (3, 3), Some(CodeLabel::Human));

    let (app, analytics, _) = world.recording_app();

    // first chunk by id carries "ai"
    api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, "ai")).unwrap();
    // now every chunk carries the attested "ai"
    api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, "blended")).unwrap();

    let events = analytics.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event, "attest_agree");
    assert_eq!(events[0].distinct_id, "dev");
    assert_eq!(events[0].properties["code_hash"], h.as_str());
    assert_eq!(events[0].properties["previous_label"], "ai");
    assert_eq!(events[0].properties["attest_label"], "ai");
    assert_eq!(events[1].event, "attest_override");
    assert_eq!(events[1].properties["previous_label"], "ai");
    assert_eq!(events[1].properties["attest_label"], "blended");
}

#[test]
fn test_relabel_compares_against_the_attested_label() {
    let world = World::new();
    let h = hash("relabelled");
    let commit = world.commit(&world.repo, "c1");
    let file = world.file(&commit, "a.rs");
    world.chunk(&file, &h, (1, 4), Some(CodeLabel::Ai));

    let (app, analytics, _) = world.recording_app();
    let mut replies = Vec::new();
    for label in ["human", "human", "ai"] {
        replies.push(
            api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, label))
                .unwrap()
                .data,
        );
    }

    assert_eq!(replies[0].previous_label, Some(CodeLabel::Ai));
    assert_eq!(replies[0].action, AttestAction::Override);
    assert_eq!(replies[1].previous_label, Some(CodeLabel::Human));
    assert_eq!(replies[1].action, AttestAction::Agree);
    assert_eq!(replies[2].previous_label, Some(CodeLabel::Human));
    assert_eq!(replies[2].action, AttestAction::Override);

    let events = analytics.events();
    let names: Vec<&str> = events.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(names, ["attest_override", "attest_agree", "attest_override"]);
    assert_eq!(events[2].properties["previous_label"], "human");
    assert_eq!(events[2].properties["attest_label"], "ai");
}

#[test]
fn test_analytics_failure_does_not_fail_the_attestation() {
    let world = World::new();
    let h = hash("quiet");
    let commit = world.commit(&world.repo, "c1");
    let file = world.file(&commit, "a.rs");
    let chunk = world.chunk(&file, &h, (1, 5), None);

    let app = world.app().with_analytics(Arc::new(RecordingAnalytics::failing()));
    let reply = api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, "ai")).unwrap();

    assert_eq!(world.store.chunk(chunk.id).unwrap().unwrap().attestation_id, Some(reply.data.id));
}

// =============================================================================
// RECALCULATION
// =============================================================================

#[test]
fn test_affected_commits_are_handed_to_the_scheduler_once() {
    let world = World::new();
    let h = hash("dup");
    let commit = world.commit(&world.repo, "c1");
    let a = world.file(&commit, "a.rs");
    let b = world.file(&commit, "b.rs");
    world.chunk(&a, &h, (1, 2), None);
    world.chunk(&b, &h, (1, 2), None);

    let scheduler = RecordingScheduler::default();
    let analytics = RecordingAnalytics::default();
    let recorder = AttestationRecorder::new(&world.store, &analytics, &scheduler);
    let outcome = recorder.record(&world.repo, &input(&h, "ai")).unwrap();

    assert_eq!(outcome.action, AttestAction::Override);
    assert_eq!(outcome.targets.file_ids.len(), 2);
    assert_eq!(scheduler.scheduled(), vec![vec![commit.id]]);
    assert!(world.store.commit(commit.id).unwrap().unwrap().needs_composition_recalculation);
}

#[test]
fn test_immediate_recalculation_updates_composition_inline() {
    let world = World::new();
    let h = hash("inline");
    let commit = world.commit(&world.repo, "c1");
    let file = world.file(&commit, "a.rs");
    world.chunk(&file, &h, (1, 30), Some(CodeLabel::Ai));
    world.chunk(&file, &hash("other"), (31, 40), Some(CodeLabel::Ai));

    let app = world.app();
    api::record_attestation(&app, "repo-acme-api", Some("dev"), &attest(&h, "human")).unwrap();

    let stored = world.store.commit_by_sha(world.repo.id, "c1").unwrap().unwrap();
    assert!(!stored.needs_composition_recalculation);
    let composition = stored.ai_composition.unwrap();
    assert_eq!(composition.total_lines, 40);
    assert!((composition.human - 75.0).abs() < f64::EPSILON);
    assert!((composition.ai - 25.0).abs() < f64::EPSILON);
}

#[test]
fn test_validation_error_surfaces_from_recorder() {
    let world = World::new();
    let scheduler = RecordingScheduler::default();
    let analytics = RecordingAnalytics::default();
    let recorder = AttestationRecorder::new(&world.store, &analytics, &scheduler);

    let err = recorder.record(&world.repo, &input("", "ai")).unwrap_err();
    assert!(matches!(err, RecordError::Invalid(_)));
    assert!(analytics.events().is_empty());
}
