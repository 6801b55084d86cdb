//! Flaky relational mirror for testing the retry queue.

use crate::application::ports::{MirrorError, RelationalMirror};
use crate::domain::sync::SyncDocType;
use crate::infrastructure::memory_mirror::InMemoryMirror;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};

/// Mirror that fails the next N writes before delegating to an in-memory
/// mirror. Used to drive failed-sync registration and replay in tests.
#[derive(Debug, Default)]
pub struct FlakyMirror {
    inner: InMemoryMirror,
    failures_remaining: AtomicU32,
}

impl FlakyMirror {
    /// Create a mirror that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with `Unavailable`.
    pub fn fail_next_writes(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// The delegate holding the successfully written rows.
    pub fn inner(&self) -> &InMemoryMirror {
        &self.inner
    }

    fn should_fail(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl RelationalMirror for FlakyMirror {
    async fn insert(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError> {
        if self.should_fail() {
            return Err(MirrorError::Unavailable("scripted failure".into()));
        }
        self.inner.insert(entity, external_id, fields).await
    }

    async fn update(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError> {
        if self.should_fail() {
            return Err(MirrorError::Unavailable("scripted failure".into()));
        }
        self.inner.update(entity, external_id, fields).await
    }

    async fn upsert(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError> {
        if self.should_fail() {
            return Err(MirrorError::Unavailable("scripted failure".into()));
        }
        self.inner.upsert(entity, external_id, fields).await
    }
}
