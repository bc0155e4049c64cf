//! Tests for the webhook dispatcher

use codeattest::core::models::InboundWebhook;
use codeattest::core::ports::{PayloadStore, WebhookRequestRepository};
use codeattest::core::services::WebhookDispatcher;
use codeattest::storage::WebhookFileStore;
use serde_json::json;

use crate::common::fixtures::World;
use crate::common::mocks::{
    FailingPayloadStore, FailingWriteBack, RecordingReporter, StubProcessor,
};

fn post(delivery: &str) -> InboundWebhook {
    InboundWebhook::post(
        [("X-Stub-Delivery", delivery), ("X-Stub-Installation", "inst-9")],
        json!({"action": "opened"}),
    )
}

fn files_under(dir: &std::path::Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    let mut count = 0;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(d) = stack.pop() {
        for entry in std::fs::read_dir(d).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                count += 1;
            }
        }
    }
    count
}

#[test]
fn test_post_is_stored_processed_and_recorded() {
    let world = World::new();
    let payloads = WebhookFileStore::new(world.webhook_dir());
    let reporter = RecordingReporter::default();
    let processor = StubProcessor::answering(202, "queued");
    let app = world.app();

    let dispatched = WebhookDispatcher::new(&payloads, &world.store, &reporter).dispatch(
        &processor,
        &app.process_context(),
        &post("d-1"),
    );

    assert_eq!(dispatched.response.status, 202);
    assert!(!dispatched.duplicate);
    assert_eq!(processor.calls(), 1);

    let record = world.store.get(dispatched.record_id.unwrap()).unwrap().unwrap();
    assert_eq!(record.provider, "stub");
    assert_eq!(record.integration.as_deref(), Some("inst-9"));
    assert_eq!(record.response_status_code, Some(202));
    assert_eq!(record.response_message.as_deref(), Some("queued"));
    assert!(record.data_file_path.ends_with("stub-d-1.json"));
    assert!(std::path::Path::new(&record.data_file_path).is_file());
    assert!(reporter.reports().is_empty());
}

#[test]
fn test_non_post_bypasses_storage() {
    let world = World::new();
    let payloads = WebhookFileStore::new(world.webhook_dir());
    let reporter = RecordingReporter::default();
    let processor = StubProcessor::answering(200, "ok");
    let app = world.app();
    let get = InboundWebhook::new("GET", [("X-Stub-Delivery", "d-1")], serde_json::Value::Null);

    let dispatched = WebhookDispatcher::new(&payloads, &world.store, &reporter).dispatch(
        &processor,
        &app.process_context(),
        &get,
    );

    assert_eq!(dispatched.response.status, 405);
    assert_eq!(dispatched.record_id, None);
    assert_eq!(processor.calls(), 0);
    assert_eq!(files_under(&world.webhook_dir()), 0);
}

#[test]
fn test_duplicate_delivery_is_not_processed_twice() {
    let world = World::new();
    let payloads = WebhookFileStore::new(world.webhook_dir());
    let reporter = RecordingReporter::default();
    let processor = StubProcessor::answering(200, "ok");
    let app = world.app();
    let dispatcher = WebhookDispatcher::new(&payloads, &world.store, &reporter);

    let first = dispatcher.dispatch(&processor, &app.process_context(), &post("same"));
    let second = dispatcher.dispatch(&processor, &app.process_context(), &post("same"));

    assert!(first.record_id.is_some());
    assert!(second.duplicate);
    assert_eq!(second.response.status, 200);
    assert_eq!(second.response.body, "already processed");
    assert_eq!(processor.calls(), 1);
    assert_eq!(files_under(&world.webhook_dir()), 1);
}

#[test]
fn test_processor_error_becomes_500_and_is_recorded() {
    let world = World::new();
    let payloads = WebhookFileStore::new(world.webhook_dir());
    let reporter = RecordingReporter::default();
    let processor = StubProcessor::failing();
    let app = world.app();

    let dispatched = WebhookDispatcher::new(&payloads, &world.store, &reporter).dispatch(
        &processor,
        &app.process_context(),
        &post("boom"),
    );

    assert_eq!(dispatched.response.status, 500);
    let record = world.store.get(dispatched.record_id.unwrap()).unwrap().unwrap();
    assert_eq!(record.response_status_code, Some(500));

    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("handler exploded"));
    assert_eq!(errors[0].tags["provider"], "stub");
}

#[test]
fn test_write_back_failure_is_reported_and_response_unchanged() {
    let world = World::new();
    let payloads = WebhookFileStore::new(world.webhook_dir());
    let requests = FailingWriteBack {
        inner: world.store.clone(),
    };
    let reporter = RecordingReporter::default();
    let processor = StubProcessor::answering(201, "created");
    let app = world.app();

    let dispatched = WebhookDispatcher::new(&payloads, &requests, &reporter).dispatch(
        &processor,
        &app.process_context(),
        &post("wb"),
    );

    assert_eq!(dispatched.response.status, 201);
    assert_eq!(dispatched.response.body, "created");
    let record = requests.get(dispatched.record_id.unwrap()).unwrap().unwrap();
    assert_eq!(record.response_status_code, None);

    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("database is locked"));
    assert!(errors[0].tags.contains_key("webhook_request_id"));
}

#[test]
fn test_storage_failure_is_reported_and_processing_continues() {
    let world = World::new();
    let reporter = RecordingReporter::default();
    let processor = StubProcessor::answering(200, "ok");
    let app = world.app();

    let dispatched = WebhookDispatcher::new(&FailingPayloadStore, &world.store, &reporter).dispatch(
        &processor,
        &app.process_context(),
        &post("lost"),
    );

    assert_eq!(dispatched.response.status, 200);
    assert_eq!(dispatched.record_id, None);
    assert_eq!(processor.calls(), 1);

    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("no space left"));
    assert!(errors[0].tags["payload"].contains("opened"));
    assert!(errors[0].tags["headers"].contains("x-stub-delivery"));
}

#[test]
fn test_missing_identifying_header_is_reported_not_fatal() {
    let world = World::new();
    let payloads = WebhookFileStore::new(world.webhook_dir());
    let reporter = RecordingReporter::default();
    let processor = StubProcessor::answering(200, "ok");
    let app = world.app();
    let request = InboundWebhook::post([("Content-Type", "application/json")], json!({}));

    let dispatched = WebhookDispatcher::new(&payloads, &world.store, &reporter).dispatch(
        &processor,
        &app.process_context(),
        &request,
    );

    assert_eq!(dispatched.response.status, 200);
    assert!(dispatched.record_id.is_some());
    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].is_error);
    assert!(reports[0].tags.contains_key("fallback_request_id"));
    assert!(payloads.root().exists());
}

#[test]
fn test_boxed_payload_store_stores() {
    let world = World::new();
    let store: Box<dyn PayloadStore> = Box::new(WebhookFileStore::new(world.webhook_dir()));
    let outcome = store.store("stub", "X-Stub-Delivery", &post("boxed")).unwrap();
    assert!(outcome.path().is_file());
}
