//! HTTP-agnostic API layer
//!
//! This module provides typed request/response structures and pure business logic
//! handlers that can be used by any HTTP server implementation (`tiny_http`, axum, etc.)
//! or called directly from tests.
//!
//! ## Design
//!
//! - **Handlers are pure functions over [`App`](crate::app::App)**: Take typed input,
//!   return `Result<T, ApiError>`
//! - **Types are framework-agnostic**: No HTTP types leak into this module
//! - **Errors carry HTTP semantics**: `ApiError` knows its status code for translation

mod error;
mod handlers;
mod types;

pub use error::{ApiError, ApiErrorData, ErrorCode};
pub use handlers::{
    ATTESTED_BY_HEADER, create_feedback, list_feedback, pull_request_composition,
    receive_webhook, record_attestation, rerun_analysis,
};
pub use types::{
    ApiResponse, AttestRequest, AttestationData, CompositionData, CreateFeedbackRequest,
    FeedbackItem, FeedbackListData, FeedbackQuery, RerunData, WithStatus,
};
