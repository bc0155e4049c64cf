//! Webhook dispatcher
//!
//! Wraps a provider-specific [`WebhookProcessor`]: persists POST payloads
//! before processing and mirrors the processor's answer onto the stored
//! record afterwards. Storage problems are captured, never returned.

use log::{debug, info, warn};

use crate::core::models::{InboundWebhook, NewWebhookRequest, StoreOutcome, WebhookResponse};
use crate::core::ports::{
    CodeRepository, ErrorReporter, ErrorTags, JobQueue, PayloadStore, WebhookRequestRepository,
};

/// Ports a processor may use while handling a POST
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    /// Repositories, pull requests, chunks
    pub code: &'a dyn CodeRepository,
    /// Deferred work (e.g. PR re-analysis)
    pub jobs: &'a dyn JobQueue,
}

impl std::fmt::Debug for ProcessContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext").finish_non_exhaustive()
    }
}

/// Provider-specific webhook handling
pub trait WebhookProcessor: Send + Sync {
    /// Provider slug used in paths and records
    fn provider(&self) -> &'static str;

    /// Header carrying the provider's unique delivery id
    fn identifying_header(&self) -> &'static str;

    /// Which integration/installation the request belongs to
    fn integration(&self, request: &InboundWebhook) -> Option<String>;

    /// Handle a POST body
    fn process_post(
        &self,
        request: &InboundWebhook,
        ctx: &ProcessContext<'_>,
    ) -> anyhow::Result<WebhookResponse>;

    /// Handle anything that is not a POST
    fn process_other(&self, request: &InboundWebhook) -> WebhookResponse {
        WebhookResponse::new(405, format!("method {} not allowed", request.method))
    }
}

/// Result of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// What the provider is told
    pub response: WebhookResponse,
    /// Stored record, when storage succeeded
    pub record_id: Option<i64>,
    /// The delivery had been recorded before and was skipped
    pub duplicate: bool,
}

/// Persists and delegates webhook requests
#[derive(Clone, Copy)]
pub struct WebhookDispatcher<'a> {
    payloads: &'a dyn PayloadStore,
    requests: &'a dyn WebhookRequestRepository,
    reporter: &'a dyn ErrorReporter,
}

impl std::fmt::Debug for WebhookDispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher").finish_non_exhaustive()
    }
}

impl<'a> WebhookDispatcher<'a> {
    /// Create a dispatcher over the given ports
    #[must_use]
    pub fn new(
        payloads: &'a dyn PayloadStore,
        requests: &'a dyn WebhookRequestRepository,
        reporter: &'a dyn ErrorReporter,
    ) -> Self {
        Self {
            payloads,
            requests,
            reporter,
        }
    }

    /// Store, process, and record one request
    pub fn dispatch(
        &self,
        processor: &dyn WebhookProcessor,
        ctx: &ProcessContext<'_>,
        request: &InboundWebhook,
    ) -> Dispatched {
        if !request.is_post() {
            return Dispatched {
                response: processor.process_other(request),
                record_id: None,
                duplicate: false,
            };
        }

        let provider = processor.provider();
        let record_id = match self.payloads.store(provider, processor.identifying_header(), request)
        {
            Ok(outcome @ StoreOutcome::AlreadyRecorded { .. }) => {
                info!("Webhook already recorded at {}, skipping", outcome.path().display());
                return Dispatched {
                    response: WebhookResponse::ok("already processed"),
                    record_id: None,
                    duplicate: true,
                };
            },
            Ok(StoreOutcome::Stored {
                path,
                request_id,
                header_missing,
            }) => {
                if header_missing {
                    let mut tags = base_tags(provider, request);
                    tags.insert("fallback_request_id".to_string(), request_id);
                    self.reporter.message(
                        &format!("{provider} webhook missing {}", processor.identifying_header()),
                        &tags,
                    );
                }
                let new = NewWebhookRequest {
                    provider: provider.to_string(),
                    integration: processor.integration(request),
                    data_file_path: path.to_string_lossy().into_owned(),
                };
                match self.requests.insert(&new) {
                    Ok(record) => Some(record.id),
                    Err(e) => {
                        self.reporter.capture(&e, &payload_tags(provider, request));
                        None
                    },
                }
            },
            Err(e) => {
                self.reporter.capture(&anyhow::Error::new(e), &payload_tags(provider, request));
                None
            },
        };

        let response = match processor.process_post(request, ctx) {
            Ok(response) => response,
            Err(e) => {
                warn!("{provider} webhook processing failed: {e:#}");
                self.reporter.capture(&e, &base_tags(provider, request));
                WebhookResponse::new(500, "webhook processing failed")
            },
        };

        if let Some(id) = record_id {
            if let Err(e) = self.requests.record_response(id, response.status, &response.body) {
                let mut tags = base_tags(provider, request);
                tags.insert("webhook_request_id".to_string(), id.to_string());
                self.reporter.capture(&e, &tags);
            } else {
                debug!("Recorded {} on webhook request {id}", response.status);
            }
        }

        Dispatched {
            response,
            record_id,
            duplicate: false,
        }
    }
}

fn base_tags(provider: &str, request: &InboundWebhook) -> ErrorTags {
    let mut tags = ErrorTags::new();
    tags.insert("provider".to_string(), provider.to_string());
    tags.insert(
        "headers".to_string(),
        serde_json::to_string(&request.headers).unwrap_or_default(),
    );
    tags
}

fn payload_tags(provider: &str, request: &InboundWebhook) -> ErrorTags {
    let mut tags = base_tags(provider, request);
    tags.insert("payload".to_string(), request.payload.to_string());
    tags
}
