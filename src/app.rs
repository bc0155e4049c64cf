//! Application wiring
//!
//! [`App`] owns the datastore and the injected strategies every API handler
//! and the server loop share.

use std::sync::Arc;

use log::info;

use crate::adapters::{LogAnalytics, LogErrorReporter, SqliteStore};
use crate::config::{Config, RecalculationMode};
use crate::core::ports::{AnalyticsSink, ErrorReporter, PayloadStore, RecalculationScheduler};
use crate::core::services::{
    AttestationRecorder, DeferredRecalculation, ImmediateRecalculation, ProcessContext,
    WebhookDispatcher,
};
use crate::storage::WebhookFileStore;

/// Shared service state
#[derive(Clone)]
pub struct App {
    /// Datastore
    pub store: SqliteStore,
    /// Raw webhook payload storage
    pub payloads: Arc<dyn PayloadStore>,
    /// What happens to affected commits after an attestation
    pub scheduler: Arc<dyn RecalculationScheduler>,
    /// Attestation analytics
    pub analytics: Arc<dyn AnalyticsSink>,
    /// Sink for swallowed errors
    pub reporter: Arc<dyn ErrorReporter>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App").field("store", &self.store).finish_non_exhaustive()
    }
}

impl App {
    /// Wire an app with inline recalculation and log-backed sinks
    #[must_use]
    pub fn new(store: SqliteStore, payloads: Arc<dyn PayloadStore>) -> Self {
        Self {
            scheduler: Arc::new(ImmediateRecalculation::new(Arc::new(store.clone()))),
            store,
            payloads,
            analytics: Arc::new(LogAnalytics::default()),
            reporter: Arc::new(LogErrorReporter),
        }
    }

    /// Replace the recalculation strategy
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn RecalculationScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replace the analytics sink
    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Replace the error reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Open the datastore and build strategies from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.storage.database_path)?;
        let payloads = Arc::new(WebhookFileStore::new(&config.storage.webhook_data_directory));

        let scheduler: Arc<dyn RecalculationScheduler> = match config.recalculation.mode {
            RecalculationMode::Immediate => {
                Arc::new(ImmediateRecalculation::new(Arc::new(store.clone())))
            },
            RecalculationMode::Deferred => {
                Arc::new(DeferredRecalculation::new(Arc::new(store.clone())))
            },
        };
        info!(
            "Using {} recalculation, database {}, webhooks under {}",
            match config.recalculation.mode {
                RecalculationMode::Immediate => "immediate",
                RecalculationMode::Deferred => "deferred",
            },
            config.storage.database_path.display(),
            config.storage.webhook_data_directory.display()
        );

        Ok(Self::new(store, payloads)
            .with_scheduler(scheduler)
            .with_analytics(Arc::new(LogAnalytics::new(config.analytics.enabled))))
    }

    /// Attestation recorder over this app's ports
    #[must_use]
    pub fn recorder(&self) -> AttestationRecorder<'_> {
        AttestationRecorder::new(&self.store, self.analytics.as_ref(), self.scheduler.as_ref())
    }

    /// Webhook dispatcher over this app's ports
    #[must_use]
    pub fn dispatcher(&self) -> WebhookDispatcher<'_> {
        WebhookDispatcher::new(self.payloads.as_ref(), &self.store, self.reporter.as_ref())
    }

    /// Context handed to webhook processors
    #[must_use]
    pub fn process_context(&self) -> ProcessContext<'_> {
        ProcessContext {
            code: &self.store,
            jobs: &self.store,
        }
    }
}
