//! Notification records and push payloads.
//!
//! A [`NotificationRecord`] is the persisted, in-app-visible notification
//! entity. It is created exactly once per SendNow decision and later mutated
//! by client read-state updates (open/read), which live outside this core.
//! The [`PushPayload`] is what actually goes over the push transport.

use crate::domain::engagement::EngagementKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Maximum length of a comment preview embedded in a notification body.
const PREVIEW_MAX_CHARS: usize = 120;

/// The content pushed to a device and mirrored into the persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Opaque data map carried alongside (type, postId, sourceEventId, ...)
    pub data: Map<String, Value>,
}

impl PushPayload {
    /// Build the first-engagement payload for a like or comment.
    ///
    /// For comments, `content` is truncated into the body as a preview.
    pub fn first_engagement(
        kind: EngagementKind,
        post_id: &str,
        event_id: &str,
        content: Option<&str>,
    ) -> Self {
        let (title, body) = match kind {
            EngagementKind::Like => ("Someone liked your post".to_string(), String::new()),
            EngagementKind::Comment => (
                "Someone commented on your post".to_string(),
                content.map(truncate_preview).unwrap_or_default(),
            ),
        };

        let mut data = Map::new();
        data.insert("type".into(), Value::String(kind.to_string()));
        data.insert("postId".into(), Value::String(post_id.to_string()));
        data.insert("sourceEventId".into(), Value::String(event_id.to_string()));

        Self { title, body, data }
    }

    /// Build a silent payload for topic broadcasts (no visible title/body).
    pub fn silent(data: Map<String, Value>) -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            data,
        }
    }
}

fn truncate_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_MAX_CHARS {
        content.to_string()
    } else {
        let cut: String = content.chars().take(PREVIEW_MAX_CHARS).collect();
        format!("{cut}…")
    }
}

/// Persisted notification entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Minted identifier for the record
    pub id: String,
    /// User whose action triggered the notification
    pub creator_user_id: String,
    /// User the notification is addressed to
    pub target_user_id: String,
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Opaque data map (type, postId, sourceEventId, ...)
    pub data: Map<String, Value>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the user opened the notification, if they have
    pub opened_at: Option<DateTime<Utc>>,
    /// When the user read the notification, if they have
    pub read_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Mint a new record from a payload.
    pub fn new(
        creator_user_id: impl Into<String>,
        target_user_id: impl Into<String>,
        payload: &PushPayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            creator_user_id: creator_user_id.into(),
            target_user_id: target_user_id.into(),
            title: payload.title.clone(),
            body: payload.body.clone(),
            data: payload.data.clone(),
            created_at,
            opened_at: None,
            read_at: None,
        }
    }
}
