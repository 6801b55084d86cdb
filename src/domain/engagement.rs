//! Engagement counters and post metadata.
//!
//! A post carries one [`EngagementMeta`] block per engagement kind (likes and
//! comments). The block holds the running counters the notification threshold
//! policy reads and updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of engagement on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    /// A like on the post
    Like,
    /// A comment on the post
    Comment,
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngagementKind::Like => write!(f, "like"),
            EngagementKind::Comment => write!(f, "comment"),
        }
    }
}

/// Running engagement counters and notification bookkeeping for one kind.
///
/// # Invariants
/// - `total_by_others` only ever grows while this subsystem owns the post
///   (self-engagement and decrements never touch it).
/// - `last_total_when_notified <= total_by_others` in steady state. Counters
///   reset externally can violate this; the policy tolerates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMeta {
    /// Total engagements of this kind, including the author's own
    pub total: u32,
    /// Engagements by users other than the post author
    pub total_by_others: u32,
    /// Value of `total_by_others` when the last notification was sent
    pub last_total_when_notified: u32,
    /// When the last immediate notification was sent, if ever
    pub last_notified_at: Option<DateTime<Utc>>,
    /// Whether a batched digest notification is pending for this post
    pub scheduled: bool,
}

impl EngagementMeta {
    /// Fresh metadata for a newly created post (all counters zero).
    pub fn new() -> Self {
        Self::default()
    }
}

/// An engagement-bearing post.
///
/// Created with zeroed counters when the post document is written. Mutated
/// only by the event processor inside a transaction keyed by the post id;
/// never deleted by this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// External/opaque post identifier
    pub id: String,
    /// User who created the post
    pub author_id: String,
    /// Like counters and bookkeeping
    pub likes: EngagementMeta,
    /// Comment counters and bookkeeping
    pub comments: EngagementMeta,
}

impl Post {
    /// Create a post with zeroed counters.
    pub fn new(id: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            likes: EngagementMeta::new(),
            comments: EngagementMeta::new(),
        }
    }

    /// The metadata block for the given engagement kind.
    pub fn meta(&self, kind: EngagementKind) -> &EngagementMeta {
        match kind {
            EngagementKind::Like => &self.likes,
            EngagementKind::Comment => &self.comments,
        }
    }

    /// Mutable access to the metadata block for the given engagement kind.
    pub fn meta_mut(&mut self, kind: EngagementKind) -> &mut EngagementMeta {
        match kind {
            EngagementKind::Like => &mut self.likes,
            EngagementKind::Comment => &mut self.comments,
        }
    }
}
