//! # engagement-notify
//!
//! Engagement summarization and notification scheduling for a location-based
//! social backend.
//!
//! When a user likes or comments on a post, this crate decides whether the
//! post's author should be pinged immediately, folded into a later digest, or
//! left alone. Per-post counters are kept transactionally in a document
//! store; the first engagement by someone other than the author notifies
//! immediately, and everything after that is summarized instead of spammed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use engagement_notify::application::dispatcher::NotificationDispatcher;
//! use engagement_notify::application::metrics::Metrics;
//! use engagement_notify::application::processor::{EngagementEventProcessor, ProcessorConfig};
//! use engagement_notify::application::replay::{ReplayConfig, ReplayScheduler};
//! use engagement_notify::application::sync_registry::FailedSyncRegistry;
//! use engagement_notify::infrastructure::clock::SystemClock;
//! use engagement_notify::infrastructure::memory_mirror::InMemoryMirror;
//! use engagement_notify::infrastructure::memory_store::InMemoryDocumentStore;
//! use engagement_notify::infrastructure::mocks::{RecordingPushTransport, StaticUserDirectory};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryDocumentStore::new());
//!     let mirror = Arc::new(InMemoryMirror::new());
//!     let clock = Arc::new(SystemClock::new());
//!     let metrics = Metrics::new();
//!
//!     let dispatcher = NotificationDispatcher::new(
//!         store.clone(),
//!         Arc::new(RecordingPushTransport::new()),
//!         Arc::new(StaticUserDirectory::new()),
//!         clock.clone(),
//!         metrics.clone(),
//!     );
//!     let registry = FailedSyncRegistry::new(store.clone(), clock.clone());
//!     let processor = EngagementEventProcessor::new(
//!         store.clone(),
//!         mirror.clone(),
//!         dispatcher,
//!         registry.clone(),
//!         clock,
//!         metrics.clone(),
//!         ProcessorConfig::default(),
//!     );
//!
//!     // Drain failed mirror writes in the background.
//!     let replay = ReplayScheduler::new(registry, mirror, metrics.clone(), ReplayConfig::default())
//!         .start();
//!
//!     let outcome = processor.on_like_created("post-1", "like-1", "bob").await;
//!     println!("decision: {:?}", outcome.map(|o| o.decision));
//!     println!("sent so far: {}", metrics.notifications_sent());
//!
//!     replay.shutdown();
//! }
//! ```
//!
//! ## Features
//!
//! ### Threshold policy
//! - **First engagement notifies**: the first like or comment from someone
//!   other than the author sends a push and persists an in-app record
//! - **Everything else summarizes**: later engagements only flag the post for
//!   a digest sweep, and only when the count actually moved since the last
//!   notification
//! - **Self-engagement is silent**: authors never get notified about their
//!   own likes or comments (their engagements still count toward raw totals)
//!
//! ### Transactional counters
//! - Per-post counters are updated under optimistic concurrency: conflicting
//!   writers abort, retry with backoff, and serialize without losing updates
//! - Notification state (last-notified timestamp, count at last notification)
//!   commits atomically with the counters that justify it
//!
//! ### Best-effort side effects
//! - Push delivery and the relational analytics mirror run strictly after
//!   commit; their failures are logged, never propagated into the counters
//! - Failed mirror writes queue durably and a background scheduler replays
//!   them in capped batches until they succeed
//!
//! ### Reply-driven connections
//! - The first chat message between two users promotes a pending connection
//!   request into an established connection, in a single transaction
//!
//! ## Observability
//!
//! Monitor pipeline behavior with built-in metrics:
//!
//! ```rust,no_run
//! # use engagement_notify::application::metrics::Metrics;
//! # let metrics = Metrics::new();
//! let snapshot = metrics.snapshot();
//! println!("processed: {}", snapshot.events_processed);
//! println!("sent: {}", snapshot.notifications_sent);
//! println!("deferred: {}", snapshot.notifications_deferred);
//! println!("mirror failures: {}", snapshot.mirror_failures);
//! ```

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    connection::{Connection, ConnectionRequest, RequestStatus},
    engagement::{EngagementKind, EngagementMeta, Post},
    event::{ChatMessageEvent, EngagementEvent, EventError},
    notification::{NotificationRecord, PushPayload},
    policy::{NotificationDecision, PolicyOutcome},
    sync::{FailedSyncEntry, SyncAction, SyncDocType},
};

pub use application::{
    counters::{CounterField, CounterStore},
    dispatcher::{DispatchError, NotificationDispatcher},
    metrics::{Metrics, MetricsSnapshot},
    ports::{
        Clock, Collection, DocKey, Document, DocumentStore, NotificationEligibility, PushTransport,
        RelationalMirror, StoreError, Transaction, UserDirectory,
    },
    processor::{EngagementEventProcessor, ProcessError, ProcessOutcome, ProcessorConfig},
    promoter::{PromoteError, PromotionOutcome, ReplyConnectionPromoter},
    replay::{ReplayConfig, ReplayHandle, ReplayReport, ReplayScheduler},
    sync_registry::FailedSyncRegistry,
};

pub use infrastructure::{
    clock::SystemClock, memory_mirror::InMemoryMirror, memory_store::InMemoryDocumentStore,
};
