//! Notification dispatch.
//!
//! The dispatcher turns a SendNow decision into a persisted
//! [`NotificationRecord`] and a best-effort push. Record persistence is the
//! success criterion: read-state tracking must work even when the push
//! transport is down, so push failures are logged and swallowed.

use crate::application::metrics::Metrics;
use crate::application::ports::{
    Clock, Collection, DocKey, DocumentStore, PushTransport, StoreError, UserDirectory,
};
use crate::domain::notification::{NotificationRecord, PushPayload};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by notification dispatch.
///
/// Only record persistence can fail the dispatch; push and eligibility
/// problems degrade to a skipped or lost push.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Persisting the notification record failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds, persists, and pushes notifications.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn DocumentStore>,
    push: Arc<dyn PushTransport>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl NotificationDispatcher {
    /// Create a dispatcher with its collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        push: Arc<dyn PushTransport>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            push,
            directory,
            clock,
            metrics,
        }
    }

    /// Persist a notification record and push it to the target user.
    ///
    /// The record is persisted first. The push is attempted only when the
    /// directory reports the user eligible and a token is registered; a push
    /// failure never fails the dispatch.
    ///
    /// # Returns
    /// The id of the persisted notification record.
    pub async fn send_and_record(
        &self,
        target_user_id: &str,
        creator_user_id: &str,
        payload: PushPayload,
    ) -> Result<String, DispatchError> {
        let record =
            NotificationRecord::new(creator_user_id, target_user_id, &payload, self.clock.now());
        let key = DocKey::new(Collection::Notifications, record.id.clone());
        let doc = serde_json::to_value(&record).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        self.store.put(key, doc).await?;
        self.metrics.record_sent();
        debug!(
            notification_id = %record.id,
            target_user_id,
            creator_user_id,
            "notification record persisted"
        );

        match self.directory.notification_eligibility(target_user_id).await {
            Ok(eligibility) if eligibility.should_notify => match eligibility.push_token {
                Some(token) => {
                    if let Err(err) = self.push.send_to_token(&token, &payload).await {
                        warn!(
                            target_user_id,
                            notification_id = %record.id,
                            error = %err,
                            "push send failed; record persisted"
                        );
                    }
                }
                None => {
                    debug!(target_user_id, "no push token registered; skipping push");
                }
            },
            Ok(_) => {
                debug!(target_user_id, "notifications disabled; skipping push");
            }
            Err(err) => {
                warn!(
                    target_user_id,
                    error = %err,
                    "eligibility lookup failed; skipping push"
                );
            }
        }

        Ok(record.id)
    }

    /// Fire-and-forget broadcast to a topic (e.g. a silent "refresh your
    /// location" push). Failures are logged only.
    pub async fn send_to_topic(&self, topic: &str, payload: &PushPayload) {
        if let Err(err) = self.push.send_to_topic(topic, payload).await {
            warn!(topic, error = %err, "topic push failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NotificationEligibility;
    use crate::domain::engagement::EngagementKind;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::memory_store::InMemoryDocumentStore;
    use crate::infrastructure::mocks::{RecordingPushTransport, StaticUserDirectory};

    fn payload() -> PushPayload {
        PushPayload::first_engagement(EngagementKind::Like, "post-1", "like-1", None)
    }

    fn dispatcher(
        store: Arc<InMemoryDocumentStore>,
        push: Arc<RecordingPushTransport>,
        directory: Arc<StaticUserDirectory>,
    ) -> NotificationDispatcher {
        NotificationDispatcher::new(
            store,
            push,
            directory,
            Arc::new(SystemClock::new()),
            Metrics::new(),
        )
    }

    #[tokio::test]
    async fn test_record_persisted_and_push_sent() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push = Arc::new(RecordingPushTransport::new());
        let directory = Arc::new(StaticUserDirectory::new());
        let dispatcher = dispatcher(store.clone(), push.clone(), directory);

        let id = dispatcher
            .send_and_record("alice", "bob", payload())
            .await
            .unwrap();

        let record = store
            .get(&DocKey::new(Collection::Notifications, id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["targetUserId"], "alice");
        assert_eq!(record["creatorUserId"], "bob");
        assert_eq!(push.token_sends().len(), 1);
    }

    #[tokio::test]
    async fn test_push_failure_still_persists_record() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push = Arc::new(RecordingPushTransport::new());
        push.fail_next_sends(1);
        let directory = Arc::new(StaticUserDirectory::new());
        let dispatcher = dispatcher(store.clone(), push.clone(), directory);

        let id = dispatcher
            .send_and_record("alice", "bob", payload())
            .await
            .unwrap();

        assert!(store
            .get(&DocKey::new(Collection::Notifications, id))
            .await
            .unwrap()
            .is_some());
        assert!(push.token_sends().is_empty());
    }

    #[tokio::test]
    async fn test_ineligible_user_skips_push() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push = Arc::new(RecordingPushTransport::new());
        let directory = Arc::new(StaticUserDirectory::new());
        directory.set_user(
            "alice",
            NotificationEligibility {
                should_notify: false,
                push_token: Some("token-alice".into()),
            },
        );
        let dispatcher = dispatcher(store.clone(), push.clone(), directory);

        dispatcher
            .send_and_record("alice", "bob", payload())
            .await
            .unwrap();

        assert!(push.token_sends().is_empty());
        assert_eq!(store.len(Collection::Notifications).await, 1);
    }

    #[tokio::test]
    async fn test_missing_token_skips_push() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push = Arc::new(RecordingPushTransport::new());
        let directory = Arc::new(StaticUserDirectory::new());
        directory.set_user(
            "alice",
            NotificationEligibility {
                should_notify: true,
                push_token: None,
            },
        );
        let dispatcher = dispatcher(store, push.clone(), directory);

        dispatcher
            .send_and_record("alice", "bob", payload())
            .await
            .unwrap();

        assert!(push.token_sends().is_empty());
    }

    #[tokio::test]
    async fn test_directory_outage_skips_push_but_persists_record() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push = Arc::new(RecordingPushTransport::new());
        let directory = Arc::new(StaticUserDirectory::new());
        directory.set_unavailable(true);
        let dispatcher = dispatcher(store.clone(), push.clone(), directory);

        let id = dispatcher
            .send_and_record("alice", "bob", payload())
            .await
            .unwrap();

        assert!(push.token_sends().is_empty());
        assert!(store
            .get(&DocKey::new(Collection::Notifications, id))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_send_to_topic_records_send() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push = Arc::new(RecordingPushTransport::new());
        let dispatcher = dispatcher(store, push.clone(), Arc::new(StaticUserDirectory::new()));

        dispatcher
            .send_to_topic("location-refresh", &PushPayload::silent(Default::default()))
            .await;

        assert_eq!(push.topic_sends().len(), 1);
        assert_eq!(push.topic_sends()[0].0, "location-refresh");
    }
}
