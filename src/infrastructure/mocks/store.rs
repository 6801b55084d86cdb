//! Flaky document store for testing transient-failure retries.

use crate::application::ports::{
    Collection, DocKey, Document, DocumentStore, StoreError, Transaction,
};
use crate::infrastructure::memory_store::InMemoryDocumentStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

/// Store that fails the next N reads and/or commits with `Unavailable`
/// before delegating to an in-memory store. Used to drive the processor's
/// transient-error retry path in tests.
#[derive(Debug, Default)]
pub struct FlakyDocumentStore {
    inner: InMemoryDocumentStore,
    read_failures: AtomicU32,
    commit_failures: AtomicU32,
}

impl FlakyDocumentStore {
    /// Create a store that accepts every operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` transactional reads fail with `Unavailable`.
    pub fn fail_next_reads(&self, count: u32) {
        self.read_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` commits fail with `Unavailable`.
    pub fn fail_next_commits(&self, count: u32) {
        self.commit_failures.store(count, Ordering::SeqCst);
    }

    /// The delegate holding the committed documents.
    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }

    fn should_fail(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl DocumentStore for FlakyDocumentStore {
    async fn read(
        &self,
        tx: &mut Transaction,
        key: &DocKey,
    ) -> Result<Option<Document>, StoreError> {
        if Self::should_fail(&self.read_failures) {
            return Err(StoreError::Unavailable("scripted outage".into()));
        }
        self.inner.read(tx, key).await
    }

    async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
        if Self::should_fail(&self.commit_failures) {
            return Err(StoreError::Unavailable("scripted outage".into()));
        }
        self.inner.commit(tx).await
    }

    async fn get(&self, key: &DocKey) -> Result<Option<Document>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: DocKey, doc: Document) -> Result<(), StoreError> {
        self.inner.put(key, doc).await
    }

    async fn delete(&self, key: &DocKey) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(DocKey, Document)>, StoreError> {
        self.inner.list(collection).await
    }
}
