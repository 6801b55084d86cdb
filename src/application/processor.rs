//! Engagement event processing.
//!
//! The processor is the transactional handler invoked on each new like or
//! comment. One pass per event: read the post's counters, run the threshold
//! policy, commit the updated counters, and only then perform the
//! best-effort side effects (push dispatch, relational mirror write).
//!
//! Counter commits use bounded optimistic retry: conflicting transactions on
//! the same post abort and are re-run from the read, so concurrent events
//! for one post serialize without losing updates. Side effects happen
//! strictly after commit and are never covered by the transaction: a failed
//! push or mirror write cannot roll back committed counters.

use crate::application::counters::{CounterField, CounterStore};
use crate::application::dispatcher::NotificationDispatcher;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, DocumentStore, RelationalMirror, StoreError, Transaction};
use crate::application::sync_registry::FailedSyncRegistry;
use crate::domain::engagement::{EngagementKind, Post};
use crate::domain::event::{EngagementEvent, EventError};
use crate::domain::notification::PushPayload;
use crate::domain::policy::{self, NotificationDecision};
use crate::domain::sync::{SyncAction, SyncDocType};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Error returned when processor configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorConfigError {
    /// At least one transaction attempt is required
    #[error("max_attempts must be greater than 0")]
    ZeroAttempts,
}

/// Configuration for the event processor's transaction retry behavior.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum transaction attempts per event (including the first)
    pub max_attempts: u32,
    /// Base sleep between attempts; grows linearly with the attempt number
    pub retry_backoff: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

impl ProcessorConfig {
    /// Create a config with the given bounds.
    ///
    /// # Errors
    /// Returns [`ProcessorConfigError::ZeroAttempts`] if `max_attempts` is zero.
    pub fn new(max_attempts: u32, retry_backoff: Duration) -> Result<Self, ProcessorConfigError> {
        if max_attempts == 0 {
            return Err(ProcessorConfigError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            retry_backoff,
        })
    }
}

/// Errors surfaced by event processing.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The event payload was malformed; not retried
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] EventError),
    /// The target post does not exist
    #[error("post {post_id} not found")]
    PostNotFound {
        /// The missing post id
        post_id: String,
    },
    /// Transient store errors persisted through every allowed attempt
    #[error("transaction retries exhausted for post {post_id} after {attempts} attempts")]
    RetriesExhausted {
        /// The contended post id
        post_id: String,
        /// Attempts made before giving up
        attempts: u32,
    },
    /// A non-retryable store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What one processed event resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// The policy decision for this event
    pub decision: NotificationDecision,
    /// The persisted notification record id, when one was created
    pub notification_id: Option<String>,
    /// The author-excluded counter after this event committed
    pub total_by_others: u32,
}

/// The transactional handler for engagement events.
///
/// Stateless per invocation; construct once with its collaborators and share
/// across concurrent handlers.
#[derive(Debug, Clone)]
pub struct EngagementEventProcessor {
    store: Arc<dyn DocumentStore>,
    counters: CounterStore,
    dispatcher: NotificationDispatcher,
    mirror: Arc<dyn RelationalMirror>,
    registry: FailedSyncRegistry,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
    config: ProcessorConfig,
}

impl EngagementEventProcessor {
    /// Create a processor with explicit dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mirror: Arc<dyn RelationalMirror>,
        dispatcher: NotificationDispatcher,
        registry: FailedSyncRegistry,
        clock: Arc<dyn Clock>,
        metrics: Metrics,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            counters: CounterStore::new(store.clone()),
            store,
            dispatcher,
            mirror,
            registry,
            clock,
            metrics,
            config,
        }
    }

    /// Handle a new like document.
    pub async fn on_like_created(
        &self,
        post_id: &str,
        like_id: &str,
        actor_id: &str,
    ) -> Result<ProcessOutcome, ProcessError> {
        let event = EngagementEvent {
            post_id: post_id.to_string(),
            actor_id: actor_id.to_string(),
            kind: EngagementKind::Like,
            event_id: like_id.to_string(),
            occurred_at: self.clock.now(),
        };
        self.process(event, None).await
    }

    /// Handle a new comment document.
    pub async fn on_comment_created(
        &self,
        post_id: &str,
        comment_id: &str,
        actor_id: &str,
        content: &str,
    ) -> Result<ProcessOutcome, ProcessError> {
        let event = EngagementEvent {
            post_id: post_id.to_string(),
            actor_id: actor_id.to_string(),
            kind: EngagementKind::Comment,
            event_id: comment_id.to_string(),
            occurred_at: self.clock.now(),
        };
        self.process(event, Some(content)).await
    }

    /// Process one engagement event to completion.
    pub async fn process(
        &self,
        event: EngagementEvent,
        content: Option<&str>,
    ) -> Result<ProcessOutcome, ProcessError> {
        event.validate()?;

        let (post, decision) = self.commit_counters(&event).await?;
        self.metrics.record_processed();
        debug!(
            post_id = %event.post_id,
            kind = %event.kind,
            decision = ?decision,
            "engagement counters committed"
        );

        let mut notification_id = None;
        match decision {
            NotificationDecision::SendNow => {
                let payload = PushPayload::first_engagement(
                    event.kind,
                    &event.post_id,
                    &event.event_id,
                    content,
                );
                match self
                    .dispatcher
                    .send_and_record(&post.author_id, &event.actor_id, payload)
                    .await
                {
                    Ok(id) => notification_id = Some(id),
                    Err(err) => {
                        // Counters stay committed; the in-app record is the
                        // only loss here.
                        warn!(
                            post_id = %event.post_id,
                            error = %err,
                            "notification dispatch failed after commit"
                        );
                    }
                }
            }
            NotificationDecision::Defer => self.metrics.record_deferred(),
            NotificationDecision::Suppress => self.metrics.record_suppressed(),
        }

        self.mirror_engagement(&event, content).await;

        Ok(ProcessOutcome {
            decision,
            notification_id,
            total_by_others: post.meta(event.kind).total_by_others,
        })
    }

    /// Run the bounded optimistic-retry transaction: bump the raw total,
    /// apply the threshold policy, and commit the updated post.
    async fn commit_counters(
        &self,
        event: &EngagementEvent,
    ) -> Result<(Post, NotificationDecision), ProcessError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            // A transient failure on the read path aborts the attempt just
            // like a failed commit, so both feed the same retry arms below.
            let mut tx = Transaction::new();
            let result = match self.try_attempt(&mut tx, event).await {
                Ok(staged) => self.store.commit(tx).await.map(|()| staged),
                Err(StoreError::NotFound(_)) => {
                    return Err(ProcessError::PostNotFound {
                        post_id: event.post_id.clone(),
                    })
                }
                Err(err) => Err(err),
            };

            match result {
                Ok((post, decision)) => return Ok((post, decision)),
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    warn!(
                        post_id = %event.post_id,
                        attempt,
                        error = %err,
                        "counter transaction aborted; retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(err) if err.is_retryable() => {
                    error!(
                        post_id = %event.post_id,
                        attempts = attempt,
                        error = %err,
                        "counter transaction retries exhausted; event dropped"
                    );
                    return Err(ProcessError::RetriesExhausted {
                        post_id: event.post_id.clone(),
                        attempts: attempt,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// One transaction attempt: read, bump, decide, stage.
    async fn try_attempt(
        &self,
        tx: &mut Transaction,
        event: &EngagementEvent,
    ) -> Result<(Post, NotificationDecision), StoreError> {
        // The raw total counts every engagement document, the author's own
        // included; the policy only governs the by-others bookkeeping.
        self.counters
            .apply_delta(tx, &event.post_id, event.kind, CounterField::Total, 1)
            .await?;

        let mut post = self.counters.read_post(tx, &event.post_id).await?;
        let outcome = policy::decide(
            post.meta(event.kind),
            &event.actor_id,
            &post.author_id,
            event.occurred_at,
        );
        *post.meta_mut(event.kind) = outcome.meta;
        self.counters.stage_post(tx, &post)?;

        Ok((post, outcome.decision))
    }

    /// Best-effort relational mirror write of the raw engagement row. On
    /// failure the mutation is queued for replay; nothing propagates to the
    /// caller from here.
    async fn mirror_engagement(&self, event: &EngagementEvent, content: Option<&str>) {
        let doc_type = match event.kind {
            EngagementKind::Like => SyncDocType::Like,
            EngagementKind::Comment => SyncDocType::Comment,
        };
        let row = engagement_row(event, content);

        if let Err(err) = self
            .mirror
            .insert(doc_type, &event.event_id, row.clone())
            .await
        {
            warn!(
                doc_type = %doc_type,
                event_id = %event.event_id,
                error = %err,
                "mirror write failed; queueing for replay"
            );
            self.metrics.record_mirror_failure();
            self.registry
                .register(SyncAction::Create, doc_type, &event.event_id, row)
                .await;
        }
    }
}

/// The relational row shape for a raw like/comment record.
fn engagement_row(event: &EngagementEvent, content: Option<&str>) -> Value {
    let mut row = json!({
        "externalEventId": event.event_id,
        "externalPostId": event.post_id,
        "externalActorId": event.actor_id,
    });
    if let (EngagementKind::Comment, Some(content)) = (event.kind, content) {
        row["content"] = Value::String(content.to_string());
    }
    row
}
