//! Infrastructure layer - adapters for the application ports.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Document store (in-memory with optimistic concurrency)
//! - Relational mirror (in-memory, keyed by external id)
//! - Test doubles for the external capabilities

pub mod clock;
pub mod memory_mirror;
pub mod memory_store;
pub mod mocks;
