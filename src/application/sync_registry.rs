//! Durable registry of failed relational mirror writes.
//!
//! Registration is the last line of defense: it must succeed independently
//! of whatever caused the original failure, and if registration itself fails
//! the error is logged and swallowed so the failure-handling path can never
//! cascade.

use crate::application::ports::{Clock, Collection, DocKey, DocumentStore, StoreError};
use crate::domain::sync::{FailedSyncEntry, SyncAction, SyncDocType};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Persists and lists failed-sync entries in the document store.
#[derive(Debug, Clone)]
pub struct FailedSyncRegistry {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl FailedSyncRegistry {
    /// Create a registry over a document store.
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn entry_key(entry_id: &str) -> DocKey {
        DocKey::new(Collection::FailedSync, entry_id)
    }

    /// Record a failed mutation for later replay.
    ///
    /// Never returns an error: a registration failure is logged and
    /// swallowed, intentionally ending the failure-handling chain here.
    pub async fn register(
        &self,
        action: SyncAction,
        doc_type: SyncDocType,
        document_id: &str,
        payload: Value,
    ) {
        let entry =
            FailedSyncEntry::new(action, doc_type, document_id, payload, self.clock.now());
        let doc = match serde_json::to_value(&entry) {
            Ok(doc) => doc,
            Err(err) => {
                error!(
                    doc_type = %doc_type,
                    document_id,
                    error = %err,
                    "failed to encode sync retry entry; mutation lost"
                );
                return;
            }
        };

        match self.store.put(Self::entry_key(&entry.id), doc).await {
            Ok(()) => {
                info!(
                    entry_id = %entry.id,
                    doc_type = %doc_type,
                    document_id,
                    "queued failed mirror write for replay"
                );
            }
            Err(err) => {
                error!(
                    doc_type = %doc_type,
                    document_id,
                    error = %err,
                    "failed to register sync retry entry; mutation lost"
                );
            }
        }
    }

    /// List all registered entries, oldest-id first. Entries that fail to
    /// decode are skipped with a warning rather than blocking the drain.
    pub async fn entries(&self) -> Result<Vec<FailedSyncEntry>, StoreError> {
        let docs = self.store.list(Collection::FailedSync).await?;
        let mut entries = Vec::with_capacity(docs.len());
        for (key, doc) in docs {
            match serde_json::from_value::<FailedSyncEntry>(doc) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping corrupt failed-sync entry");
                }
            }
        }
        Ok(entries)
    }

    /// Delete a replayed entry. A missing entry counts as success: a
    /// concurrent replay pass already drained it.
    pub async fn remove(&self, entry_id: &str) -> Result<(), StoreError> {
        match self.store.delete(&Self::entry_key(entry_id)).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
