//! Common test utilities shared across test types
//!
//! - `fixtures.rs` - Seeded datastores and app wiring
//! - `mocks.rs` - Recording and failing port implementations
