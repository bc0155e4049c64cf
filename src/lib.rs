//! codeattest - Code attestation and webhook ingestion service
//!
//! This library provides the core functionality for recording attestations
//! of AI/human code labels, broadcasting them across an organization by
//! content hash, recomputing composition, and ingesting provider webhooks.

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod output;
pub mod paths;
pub mod providers;
pub mod server;
pub mod storage;
pub mod worker;
