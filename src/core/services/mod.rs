//! Business logic services
//!
//! Orchestration over the port traits. Services never touch a concrete
//! database or filesystem; they receive the ports they need.
//!
//! - [`recorder`] - Record an attestation and broadcast it
//! - [`dispatcher`] - Persist, delegate, and record webhook requests
//! - [`recalculation`] - Immediate and deferred composition recalculation

pub mod dispatcher;
pub mod recalculation;
pub mod recorder;

pub use dispatcher::{Dispatched, ProcessContext, WebhookDispatcher, WebhookProcessor};
pub use recalculation::{DeferredRecalculation, ImmediateRecalculation, recalculate_commits};
pub use recorder::{AttestationOutcome, AttestationRecorder, RecordError};
