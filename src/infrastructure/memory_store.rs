//! In-memory transactional document store.
//!
//! Documents are versioned JSON values in a DashMap. Transactions validate
//! the versions they read at commit time behind a store-wide write gate, so
//! conflicting commits on the same document abort with
//! [`StoreError::Conflict`] instead of losing updates. This mirrors the
//! optimistic-concurrency behavior of the hosted document store the
//! production adapters target.

use crate::application::ports::{
    Collection, DocKey, Document, DocumentStore, StoreError, Transaction,
};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct VersionedDoc {
    version: u64,
    doc: Document,
}

/// Thread-safe in-memory document store with optimistic concurrency.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: DashMap<DocKey, VersionedDoc>,
    // Serializes commit validation with all writes so version checks and
    // write application are atomic with respect to each other.
    write_gate: Mutex<()>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection. Test/diagnostic helper.
    pub async fn len(&self, collection: Collection) -> usize {
        self.docs
            .iter()
            .filter(|entry| entry.key().collection == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(
        &self,
        tx: &mut Transaction,
        key: &DocKey,
    ) -> Result<Option<Document>, StoreError> {
        // Read-your-writes inside the transaction.
        if let Some(staged) = tx.staged(key) {
            return Ok(Some(staged.clone()));
        }
        match self.docs.get(key) {
            Some(entry) => {
                tx.record_read(key.clone(), Some(entry.version));
                Ok(Some(entry.doc.clone()))
            }
            None => {
                tx.record_read(key.clone(), None);
                Ok(None)
            }
        }
    }

    async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;

        for (key, observed) in tx.reads() {
            let current = self.docs.get(key).map(|entry| entry.version);
            if current != *observed {
                return Err(StoreError::Conflict(key.to_string()));
            }
        }

        for (key, doc) in tx.writes() {
            let version = self.docs.get(key).map(|entry| entry.version).unwrap_or(0) + 1;
            self.docs.insert(
                key.clone(),
                VersionedDoc {
                    version,
                    doc: doc.clone(),
                },
            );
        }

        Ok(())
    }

    async fn get(&self, key: &DocKey) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.get(key).map(|entry| entry.doc.clone()))
    }

    async fn put(&self, key: DocKey, doc: Document) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        let version = self.docs.get(&key).map(|entry| entry.version).unwrap_or(0) + 1;
        self.docs.insert(key, VersionedDoc { version, doc });
        Ok(())
    }

    async fn delete(&self, key: &DocKey) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        match self.docs.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(DocKey, Document)>, StoreError> {
        let mut docs: Vec<(DocKey, Document)> = self
            .docs
            .iter()
            .filter(|entry| entry.key().collection == collection)
            .map(|entry| (entry.key().clone(), entry.value().doc.clone()))
            .collect();
        docs.sort_by(|(a, _), (b, _)| a.id.cmp(&b.id));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(id: &str) -> DocKey {
        DocKey::new(Collection::Posts, id)
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemoryDocumentStore::new();

        store.put(key("a"), json!({ "v": 1 })).await.unwrap();
        assert_eq!(store.get(&key("a")).await.unwrap(), Some(json!({ "v": 1 })));

        store.delete(&key("a")).await.unwrap();
        assert_eq!(store.get(&key("a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store.delete(&key("missing")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transaction_read_then_commit() {
        let store = InMemoryDocumentStore::new();
        store.put(key("a"), json!({ "v": 1 })).await.unwrap();

        let mut tx = Transaction::new();
        let doc = store.read(&mut tx, &key("a")).await.unwrap().unwrap();
        assert_eq!(doc, json!({ "v": 1 }));

        tx.stage(key("a"), json!({ "v": 2 }));
        store.commit(tx).await.unwrap();

        assert_eq!(store.get(&key("a")).await.unwrap(), Some(json!({ "v": 2 })));
    }

    #[tokio::test]
    async fn test_conflicting_commit_aborts() {
        let store = InMemoryDocumentStore::new();
        store.put(key("a"), json!({ "v": 1 })).await.unwrap();

        let mut tx1 = Transaction::new();
        store.read(&mut tx1, &key("a")).await.unwrap();
        tx1.stage(key("a"), json!({ "v": 2 }));

        let mut tx2 = Transaction::new();
        store.read(&mut tx2, &key("a")).await.unwrap();
        tx2.stage(key("a"), json!({ "v": 3 }));

        store.commit(tx1).await.unwrap();
        let err = store.commit(tx2).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // The first commit's write survived.
        assert_eq!(store.get(&key("a")).await.unwrap(), Some(json!({ "v": 2 })));
    }

    #[tokio::test]
    async fn test_read_of_absent_doc_conflicts_with_creation() {
        let store = InMemoryDocumentStore::new();

        let mut tx = Transaction::new();
        assert!(store.read(&mut tx, &key("a")).await.unwrap().is_none());
        tx.stage(key("a"), json!({ "v": 1 }));

        // Another writer creates the document first.
        store.put(key("a"), json!({ "other": true })).await.unwrap();

        let err = store.commit(tx).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_read_your_writes() {
        let store = InMemoryDocumentStore::new();
        store.put(key("a"), json!({ "v": 1 })).await.unwrap();

        let mut tx = Transaction::new();
        store.read(&mut tx, &key("a")).await.unwrap();
        tx.stage(key("a"), json!({ "v": 9 }));

        let doc = store.read(&mut tx, &key("a")).await.unwrap().unwrap();
        assert_eq!(doc, json!({ "v": 9 }));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_by_id() {
        let store = InMemoryDocumentStore::new();
        store.put(key("b"), json!({})).await.unwrap();
        store.put(key("a"), json!({})).await.unwrap();
        store
            .put(DocKey::new(Collection::Notifications, "n"), json!({}))
            .await
            .unwrap();

        let docs = store.list(Collection::Posts).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|(k, _)| k.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_len_counts_per_collection() {
        let store = InMemoryDocumentStore::new();
        store.put(key("a"), json!({})).await.unwrap();
        store
            .put(DocKey::new(Collection::Notifications, "n"), json!({}))
            .await
            .unwrap();

        assert_eq!(store.len(Collection::Posts).await, 1);
        assert_eq!(store.len(Collection::Notifications).await, 1);
        assert_eq!(store.len(Collection::FailedSync).await, 0);
    }
}
