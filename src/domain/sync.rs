//! Failed-sync retry entries.
//!
//! When a best-effort relational mirror write fails, the mutation is captured
//! as a [`FailedSyncEntry`] with enough data to replay it later. Entries are
//! deleted once the replay scheduler successfully re-applies them; replaying
//! is idempotent because mirror rows are keyed by the original external id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// The kind of mutation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// Row creation
    Create,
    /// Row update
    Update,
    /// Row deletion
    Delete,
}

/// The mirrored entity type, which selects the replay handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDocType {
    /// User profile row
    User,
    /// Post row
    Post,
    /// Comment row
    Comment,
    /// Like row
    Like,
    /// Push notification token row
    NotificationToken,
}

impl fmt::Display for SyncDocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDocType::User => write!(f, "user"),
            SyncDocType::Post => write!(f, "post"),
            SyncDocType::Comment => write!(f, "comment"),
            SyncDocType::Like => write!(f, "like"),
            SyncDocType::NotificationToken => write!(f, "notification_token"),
        }
    }
}

/// A durable record of a mirror write that must be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSyncEntry {
    /// Minted identifier for the entry
    pub id: String,
    /// Entity type, keys the replay dispatch
    pub doc_type: SyncDocType,
    /// The failed mutation kind
    pub action: SyncAction,
    /// External id of the document the mutation targets
    pub document_id: String,
    /// Full field payload, sufficient to re-apply the mutation
    pub payload: Value,
    /// When the failure was recorded
    pub created_at: DateTime<Utc>,
}

impl FailedSyncEntry {
    /// Mint a new entry for a failed mutation.
    pub fn new(
        action: SyncAction,
        doc_type: SyncDocType,
        document_id: impl Into<String>,
        payload: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            doc_type,
            action,
            document_id: document_id.into(),
            payload,
            created_at,
        }
    }
}
