//! Core domain logic for codeattest
//!
//! This module contains business logic with no direct I/O.
//! All external interactions are abstracted through port traits.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (chunks, attestations, webhooks, jobs)
//! - `services/` - Business logic orchestration
//! - `ports/` - Trait definitions for external dependencies

pub mod models;
pub mod ports;
pub mod services;
