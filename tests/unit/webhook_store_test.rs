//! Tests for on-disk webhook payload storage

use std::fs;

use chrono::{TimeZone, Utc};
use codeattest::core::models::{InboundWebhook, StoreOutcome};
use codeattest::storage::WebhookFileStore;
use serde_json::json;
use tempfile::TempDir;

fn delivery(id: Option<&str>) -> InboundWebhook {
    let mut headers = vec![("Content-Type", "application/json"), ("X-GitHub-Event", "ping")];
    if let Some(id) = id {
        headers.push(("X-GitHub-Delivery", id));
    }
    InboundWebhook::post(headers, json!({"zen": "Keep it logically awesome."}))
}

#[test]
fn test_stores_headers_and_payload_under_dated_path() {
    let temp = TempDir::new().unwrap();
    let store = WebhookFileStore::new(temp.path());
    let at = Utc.with_ymd_and_hms(2024, 11, 5, 23, 1, 2).unwrap();

    let outcome = store
        .store_at("GitHub", "X-GitHub-Delivery", &delivery(Some("ABC-123")), at)
        .unwrap();

    let StoreOutcome::Stored {
        path,
        request_id,
        header_missing,
    } = outcome
    else {
        panic!("expected a stored payload");
    };
    assert_eq!(path, temp.path().join("2024/11/05/23/github-abc-123.json"));
    assert_eq!(request_id, "ABC-123");
    assert!(!header_missing);

    let content: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(content["headers"]["x-github-event"], "ping");
    assert_eq!(content["payload"]["zen"], "Keep it logically awesome.");
}

#[test]
fn test_duplicate_delivery_is_not_overwritten() {
    let temp = TempDir::new().unwrap();
    let store = WebhookFileStore::new(temp.path());
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let first = store.store_at("github", "X-GitHub-Delivery", &delivery(Some("d1")), at).unwrap();
    let original = fs::read_to_string(first.path()).unwrap();

    let replay = InboundWebhook::post([("X-GitHub-Delivery", "d1")], json!({"changed": true}));
    let second = store.store_at("github", "X-GitHub-Delivery", &replay, at).unwrap();

    assert!(matches!(second, StoreOutcome::AlreadyRecorded { .. }));
    assert_eq!(second.path(), first.path());
    assert_eq!(fs::read_to_string(first.path()).unwrap(), original);
}

#[test]
fn test_missing_header_falls_back_to_random_id() {
    let temp = TempDir::new().unwrap();
    let store = WebhookFileStore::new(temp.path());
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let a = store.store_at("gitlab", "X-Gitlab-Event-UUID", &delivery(None), at).unwrap();
    let b = store.store_at("gitlab", "X-Gitlab-Event-UUID", &delivery(None), at).unwrap();

    match (&a, &b) {
        (
            StoreOutcome::Stored {
                request_id: id_a,
                header_missing: true,
                ..
            },
            StoreOutcome::Stored {
                request_id: id_b,
                header_missing: true,
                ..
            },
        ) => {
            assert!(uuid::Uuid::parse_str(id_a).is_ok());
            assert_ne!(id_a, id_b);
        },
        other => panic!("expected two fallback stores, got {other:?}"),
    }
    assert!(a.path().exists());
    assert!(b.path().exists());
}

#[test]
fn test_creates_missing_directories() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("deep/nested/root");
    let store = WebhookFileStore::new(&root);

    let outcome = store
        .store_at("github", "X-GitHub-Delivery", &delivery(Some("x")), Utc::now())
        .unwrap();
    assert!(outcome.path().starts_with(&root));
    assert!(outcome.path().is_file());
}
