//! In-memory relational mirror.
//!
//! Rows are keyed by (entity type, external id), which is exactly what makes
//! mirror writes safe to replay: re-inserting an existing row is a no-op.

use crate::application::ports::{MirrorError, RelationalMirror};
use crate::domain::sync::SyncDocType;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// Thread-safe in-memory mirror keyed by external id.
#[derive(Debug, Default)]
pub struct InMemoryMirror {
    rows: DashMap<(SyncDocType, String), Value>,
}

impl InMemoryMirror {
    /// Create an empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a row. Test/diagnostic helper.
    pub fn row(&self, entity: SyncDocType, external_id: &str) -> Option<Value> {
        self.rows
            .get(&(entity, external_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Number of rows of an entity type. Test/diagnostic helper.
    pub fn count(&self, entity: SyncDocType) -> usize {
        self.rows.iter().filter(|entry| entry.key().0 == entity).count()
    }
}

#[async_trait]
impl RelationalMirror for InMemoryMirror {
    async fn insert(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError> {
        // Create-if-absent: the row is keyed by the external id, so a retried
        // insert of the same event is a no-op rather than a duplicate.
        self.rows
            .entry((entity, external_id.to_string()))
            .or_insert(fields);
        Ok(())
    }

    async fn update(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError> {
        match self.rows.get_mut(&(entity, external_id.to_string())) {
            Some(mut entry) => {
                *entry.value_mut() = fields;
                Ok(())
            }
            None => Err(MirrorError::Rejected(format!(
                "no {entity} row for external id {external_id}"
            ))),
        }
    }

    async fn upsert(
        &self,
        entity: SyncDocType,
        external_id: &str,
        fields: Value,
    ) -> Result<(), MirrorError> {
        self.rows.insert((entity, external_id.to_string()), fields);
        Ok(())
    }
}
