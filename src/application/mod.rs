//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Counter store (transactional post counter access)
//! - Engagement event processor (the per-event transactional handler)
//! - Notification dispatcher (record persistence + best-effort push)
//! - Failed-sync registry and replay scheduler (durable retry queue)
//! - Reply connection promoter (request → connection state machine)
//! - Metrics (observability counters)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod counters;
pub mod dispatcher;
pub mod metrics;
pub mod ports;
pub mod processor;
pub mod promoter;
pub mod replay;
pub mod sync_registry;
