//! Triggering event shapes and boundary validation.
//!
//! Events arrive from the upstream document store triggers. They are
//! ephemeral: each one drives a single handler invocation and is never
//! persisted by this subsystem. Malformed events fail fast at the handler
//! boundary and are never retried.

use crate::domain::engagement::EngagementKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when an incoming event is structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A required identifier field was empty
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// An actor engaged with themselves in a way the event shape forbids
    #[error("sender and receiver are the same user `{0}`")]
    SelfAddressed(String),
}

/// A new like or comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementEvent {
    /// Post the engagement targets
    pub post_id: String,
    /// User who liked or commented
    pub actor_id: String,
    /// Like or comment
    pub kind: EngagementKind,
    /// External id of the underlying like/comment document
    pub event_id: String,
    /// When the engagement document was created
    pub occurred_at: DateTime<Utc>,
}

impl EngagementEvent {
    /// Validate required fields, failing fast on malformed input.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.post_id.is_empty() {
            return Err(EventError::MissingField("postId"));
        }
        if self.actor_id.is_empty() {
            return Err(EventError::MissingField("actorId"));
        }
        if self.event_id.is_empty() {
            return Err(EventError::MissingField("eventId"));
        }
        Ok(())
    }
}

/// A new chat message between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEvent {
    /// Thread the message belongs to
    pub thread_id: String,
    /// External id of the message document
    pub message_id: String,
    /// User who sent the message
    pub sender_id: String,
    /// User the message is addressed to
    pub receiver_id: String,
    /// Whether no prior message document existed in this thread at event time
    pub is_first_in_thread: bool,
}

impl ChatMessageEvent {
    /// Validate required fields, failing fast on malformed input.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.thread_id.is_empty() {
            return Err(EventError::MissingField("threadId"));
        }
        if self.message_id.is_empty() {
            return Err(EventError::MissingField("messageId"));
        }
        if self.sender_id.is_empty() {
            return Err(EventError::MissingField("senderId"));
        }
        if self.receiver_id.is_empty() {
            return Err(EventError::MissingField("receiverId"));
        }
        if self.sender_id == self.receiver_id {
            return Err(EventError::SelfAddressed(self.sender_id.clone()));
        }
        Ok(())
    }
}
