//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.
//!
//! The transactional document store is the only port with cross-invocation
//! coordination: conflicting transactions on the same document abort with
//! [`StoreError::Conflict`] and callers retry, so lost updates are
//! impossible. The transaction is an explicit value passed into store
//! operations, never ambient state.

use crate::domain::notification::PushPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt::{self, Debug};
use thiserror::Error;

use crate::domain::sync::SyncDocType;

/// A stored document. Documents are schemaless JSON at the store boundary;
/// the application layer decodes them into domain types.
pub type Document = Value;

/// Top-level collections in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Engagement-bearing posts
    Posts,
    /// Persisted notification records
    Notifications,
    /// Failed-sync retry entries
    FailedSync,
    /// Directed connection requests
    ConnectionRequests,
    /// Established connections
    Connections,
}

impl Collection {
    /// Collection name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Notifications => "notifications",
            Collection::FailedSync => "failed_sync",
            Collection::ConnectionRequests => "connection_requests",
            Collection::Connections => "connections",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully qualified document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    /// The collection the document lives in
    pub collection: Collection,
    /// External/opaque document id within the collection
    pub id: String,
}

impl DocKey {
    /// Build a key.
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Errors surfaced by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested document does not exist
    #[error("document not found: {0}")]
    NotFound(String),
    /// Another transaction committed a conflicting write first
    #[error("transaction conflict on {0}")]
    Conflict(String),
    /// The store is temporarily unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A stored document failed to decode into its domain type
    #[error("corrupt document {key}: {source}")]
    Corrupt {
        /// Key of the offending document
        key: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Whether a retry of the whole transaction attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_) | StoreError::Unavailable(_))
    }
}

/// An explicit optimistic transaction.
///
/// Reads record the version observed for each key (or its absence); writes
/// are buffered until commit. Reads within the transaction observe its own
/// staged writes. Commit validates every recorded version and applies the
/// buffered writes atomically, failing with [`StoreError::Conflict`] if any
/// read document changed underneath the transaction.
#[derive(Debug, Default)]
pub struct Transaction {
    reads: Vec<(DocKey, Option<u64>)>,
    writes: Vec<(DocKey, Document)>,
}

impl Transaction {
    /// Begin an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a write, replacing any earlier staged write for the same key.
    pub fn stage(&mut self, key: DocKey, doc: Document) {
        if let Some(slot) = self.writes.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = doc;
        } else {
            self.writes.push((key, doc));
        }
    }

    /// The staged write for a key, if any.
    pub fn staged(&self, key: &DocKey) -> Option<&Document> {
        self.writes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, doc)| doc)
    }

    /// Record the version observed for a key. Only the first observation per
    /// key is kept; later reads within the transaction see staged writes.
    pub fn record_read(&mut self, key: DocKey, version: Option<u64>) {
        if !self.reads.iter().any(|(k, _)| *k == key) {
            self.reads.push((key, version));
        }
    }

    /// Recorded reads, for commit-time validation by store adapters.
    pub fn reads(&self) -> &[(DocKey, Option<u64>)] {
        &self.reads
    }

    /// Buffered writes, for commit-time application by store adapters.
    pub fn writes(&self) -> &[(DocKey, Document)] {
        &self.writes
    }
}

/// Port for the transactional document store.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Read a document within a transaction, recording its version. Returns
    /// the transaction's own staged write if one exists for the key.
    async fn read(
        &self,
        tx: &mut Transaction,
        key: &DocKey,
    ) -> Result<Option<Document>, StoreError>;

    /// Validate recorded read versions and apply buffered writes atomically.
    async fn commit(&self, tx: Transaction) -> Result<(), StoreError>;

    /// Non-transactional point read.
    async fn get(&self, key: &DocKey) -> Result<Option<Document>, StoreError>;

    /// Non-transactional upsert.
    async fn put(&self, key: DocKey, doc: Document) -> Result<(), StoreError>;

    /// Delete a document. Fails with [`StoreError::NotFound`] if absent.
    async fn delete(&self, key: &DocKey) -> Result<(), StoreError>;

    /// List all documents in a collection, ordered by id.
    async fn list(&self, collection: Collection) -> Result<Vec<(DocKey, Document)>, StoreError>;
}

/// Errors surfaced by the relational mirror.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The mirror is temporarily unreachable
    #[error("mirror unavailable: {0}")]
    Unavailable(String),
    /// The mirror rejected the mutation
    #[error("mirror rejected write: {0}")]
    Rejected(String),
}

/// Port for the best-effort relational mirror.
///
/// Rows are keyed by the external id minted upstream, which makes `insert`
/// safe to retry: re-creating an existing row is a no-op, not a duplicate.
#[async_trait]
pub trait RelationalMirror: Send + Sync + Debug {
    /// Create a row. Idempotent with respect to `external_id`.
    async fn insert(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError>;

    /// Update an existing row.
    async fn update(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError>;

    /// Create or replace a row.
    async fn upsert(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError>;
}

/// Errors surfaced by the push transport.
#[derive(Debug, Error)]
pub enum PushError {
    /// The underlying send call failed
    #[error("push transport error: {0}")]
    Transport(String),
}

/// Port for the external push transport (APNs/FCM behind one capability).
#[async_trait]
pub trait PushTransport: Send + Sync + Debug {
    /// Send a payload to one device token.
    async fn send_to_token(&self, token: &str, payload: &PushPayload) -> Result<(), PushError>;

    /// Send a payload to a topic subscription.
    async fn send_to_topic(&self, topic: &str, payload: &PushPayload) -> Result<(), PushError>;
}

/// A user's notification eligibility, as reported by the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEligibility {
    /// Whether the user accepts push notifications at all
    pub should_notify: bool,
    /// The user's registered device token, if any
    pub push_token: Option<String>,
}

/// Errors surfaced by the user directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory is temporarily unreachable
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// Port for the external user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync + Debug {
    /// Look up whether and where a user can be pushed to.
    async fn notification_eligibility(
        &self,
        user_id: &str,
    ) -> Result<NotificationEligibility, DirectoryError>;
}

/// Port for obtaining current wall-clock time.
///
/// This abstraction allows the application layer to work with time without
/// depending on the system clock. Infrastructure provides concrete
/// implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_doc_key_display() {
        let key = DocKey::new(Collection::Posts, "post-1");
        assert_eq!(key.to_string(), "posts/post-1");
    }

    #[test]
    fn test_transaction_stage_replaces_by_key() {
        let mut tx = Transaction::new();
        let key = DocKey::new(Collection::Posts, "post-1");

        tx.stage(key.clone(), json!({ "v": 1 }));
        tx.stage(key.clone(), json!({ "v": 2 }));

        assert_eq!(tx.writes().len(), 1);
        assert_eq!(tx.staged(&key), Some(&json!({ "v": 2 })));
    }

    #[test]
    fn test_transaction_records_first_read_only() {
        let mut tx = Transaction::new();
        let key = DocKey::new(Collection::Posts, "post-1");

        tx.record_read(key.clone(), Some(3));
        tx.record_read(key.clone(), Some(9));

        assert_eq!(tx.reads(), &[(key, Some(3))]);
    }

    #[test]
    fn test_store_error_retryability() {
        assert!(StoreError::Conflict("posts/p".into()).is_retryable());
        assert!(StoreError::Unavailable("down".into()).is_retryable());
        assert!(!StoreError::NotFound("posts/p".into()).is_retryable());
    }
}
