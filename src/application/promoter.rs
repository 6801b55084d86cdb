//! Promotion of connection requests on first reply.
//!
//! A pending connection request is promoted to a connection the moment the
//! first chat message appears in the thread between the two users, whichever
//! of them sent it. The promotion is a single transaction: the request flips
//! to accepted and the connection document is created together, so a racing
//! duplicate delivery either conflicts (and retries into the no-pending
//! branch) or finds the request already accepted.

use crate::application::ports::{
    Clock, Collection, DocKey, DocumentStore, StoreError, Transaction,
};
use crate::domain::connection::{Connection, ConnectionRequest};
use crate::domain::event::{ChatMessageEvent, EventError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Transaction attempts before giving up on a contended promotion.
const MAX_ATTEMPTS: u32 = 3;

/// Errors surfaced by promotion.
#[derive(Debug, Error)]
pub enum PromoteError {
    /// The event payload was malformed; not retried
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] EventError),
    /// Transient store errors persisted through every allowed attempt
    #[error("promotion retries exhausted for thread {thread_id}")]
    RetriesExhausted {
        /// The contended thread id
        thread_id: String,
    },
    /// A non-retryable store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a chat-message event resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// A pending request was promoted to a connection
    Promoted {
        /// Id of the created connection document
        connection_id: String,
    },
    /// First message, but no pending request in either direction
    NoPendingRequest,
    /// Not the first message in the thread; ordinary message, no side effect
    NotFirstMessage,
}

/// Detects first replies to pending connection requests and promotes them.
#[derive(Debug, Clone)]
pub struct ReplyConnectionPromoter {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl ReplyConnectionPromoter {
    /// Create a promoter over the document store.
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Handle a new chat message.
    pub async fn on_chat_message(
        &self,
        event: &ChatMessageEvent,
    ) -> Result<PromotionOutcome, PromoteError> {
        event.validate()?;

        if !event.is_first_in_thread {
            return Ok(PromotionOutcome::NotFirstMessage);
        }

        for attempt in 1..=MAX_ATTEMPTS {
            let mut tx = Transaction::new();

            // Either party could have sent the original request, so both
            // directions are checked.
            let pending = match self
                .pending_request(&mut tx, &event.sender_id, &event.receiver_id)
                .await?
            {
                Some(found) => Some(found),
                None => {
                    self.pending_request(&mut tx, &event.receiver_id, &event.sender_id)
                        .await?
                }
            };

            let (key, mut request) = match pending {
                Some(found) => found,
                None => {
                    debug!(
                        thread_id = %event.thread_id,
                        "first message with no pending request; no side effect"
                    );
                    return Ok(PromotionOutcome::NoPendingRequest);
                }
            };

            request.accept();
            let request_doc =
                serde_json::to_value(&request).map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                })?;
            tx.stage(key, request_doc);

            let connection = Connection::from_request(&request, self.clock.now());
            let connection_key = DocKey::new(Collection::Connections, connection.id.clone());
            let connection_doc =
                serde_json::to_value(&connection).map_err(|source| StoreError::Corrupt {
                    key: connection_key.to_string(),
                    source,
                })?;
            tx.stage(connection_key, connection_doc);

            match self.store.commit(tx).await {
                Ok(()) => {
                    info!(
                        thread_id = %event.thread_id,
                        connection_id = %connection.id,
                        from = %request.from_user_id,
                        to = %request.to_user_id,
                        "promoted connection request"
                    );
                    return Ok(PromotionOutcome::Promoted {
                        connection_id: connection.id,
                    });
                }
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        thread_id = %event.thread_id,
                        attempt,
                        error = %err,
                        "promotion transaction aborted; retrying"
                    );
                }
                Err(err) if err.is_retryable() => {
                    return Err(PromoteError::RetriesExhausted {
                        thread_id: event.thread_id.clone(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(PromoteError::RetriesExhausted {
            thread_id: event.thread_id.clone(),
        })
    }

    /// Look up a pending request for the ordered pair, if one exists.
    async fn pending_request(
        &self,
        tx: &mut Transaction,
        from: &str,
        to: &str,
    ) -> Result<Option<(DocKey, ConnectionRequest)>, StoreError> {
        let key = DocKey::new(
            Collection::ConnectionRequests,
            ConnectionRequest::doc_id(from, to),
        );
        let Some(doc) = self.store.read(tx, &key).await? else {
            return Ok(None);
        };
        let request: ConnectionRequest =
            serde_json::from_value(doc).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })?;
        Ok(request.is_pending().then_some((key, request)))
    }
}
