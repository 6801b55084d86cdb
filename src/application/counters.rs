//! Per-post engagement counter access.
//!
//! The counter store wraps the document store with typed read/stage helpers
//! for [`Post`] documents. All operations run against a caller-supplied
//! [`Transaction`]: the read-then-write shape is deliberate, because the
//! threshold policy needs the pre-update counter values to decide
//! notification eligibility. Serialization of conflicting writers on the
//! same post is the store's optimistic commit, not a blind atomic increment.

use crate::application::ports::{Collection, DocKey, DocumentStore, StoreError, Transaction};
use crate::domain::engagement::{EngagementKind, Post};
use std::sync::Arc;

/// Which counter of an engagement metadata block to adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    /// The overall count, including the author's own engagement
    Total,
    /// The author-excluded count
    TotalByOthers,
}

/// Typed access to post counters over the document store.
#[derive(Debug, Clone)]
pub struct CounterStore {
    store: Arc<dyn DocumentStore>,
}

impl CounterStore {
    /// Create a counter store over a document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Key for a post document.
    pub fn post_key(post_id: &str) -> DocKey {
        DocKey::new(Collection::Posts, post_id)
    }

    /// Read a post within the transaction. Fails with
    /// [`StoreError::NotFound`] if the post does not exist.
    pub async fn read_post(
        &self,
        tx: &mut Transaction,
        post_id: &str,
    ) -> Result<Post, StoreError> {
        let key = Self::post_key(post_id);
        let doc = self
            .store
            .read(tx, &key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        serde_json::from_value(doc).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })
    }

    /// Stage an updated post into the transaction.
    pub fn stage_post(&self, tx: &mut Transaction, post: &Post) -> Result<(), StoreError> {
        let key = Self::post_key(&post.id);
        let doc = serde_json::to_value(post).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        tx.stage(key, doc);
        Ok(())
    }

    /// Apply a delta to one counter, returning the new value.
    ///
    /// Read-then-write inside the transaction: callers that read the post
    /// beforehand observed the pre-update value. Deltas never take a counter
    /// below zero; this subsystem never decrements, but externally reset
    /// documents must not underflow.
    pub async fn apply_delta(
        &self,
        tx: &mut Transaction,
        post_id: &str,
        kind: EngagementKind,
        field: CounterField,
        delta: i64,
    ) -> Result<u32, StoreError> {
        let mut post = self.read_post(tx, post_id).await?;
        let meta = post.meta_mut(kind);
        let current = match field {
            CounterField::Total => meta.total,
            CounterField::TotalByOthers => meta.total_by_others,
        };
        let next = (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32;
        match field {
            CounterField::Total => meta.total = next,
            CounterField::TotalByOthers => meta.total_by_others = next,
        }
        self.stage_post(tx, &post)?;
        Ok(next)
    }
}
