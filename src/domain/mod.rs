//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the engagement
//! notification system:
//! - Engagement counters and post metadata
//! - The notification threshold policy
//! - Event shapes and boundary validation
//! - Notification records and push payloads
//! - Failed-sync retry entries
//! - Connection requests and connections
//!
//! All types in this layer are pure and easily testable.

pub mod connection;
pub mod engagement;
pub mod event;
pub mod notification;
pub mod policy;
pub mod sync;
