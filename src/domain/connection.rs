//! Connection requests and established connections.
//!
//! A pending [`ConnectionRequest`] is promoted to a [`Connection`] when the
//! recipient (or the requester) sends the first chat message in the thread.
//! Promotion is a one-way transition: a request never moves back from
//! `Accepted` to `Pending`, and at most one pending request exists per
//! ordered user pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for a reply
    Pending,
    /// Promoted to a connection
    Accepted,
}

/// A directed connection request between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    /// User who sent the request
    pub from_user_id: String,
    /// User the request is addressed to
    pub to_user_id: String,
    /// Current request status
    pub status: RequestStatus,
    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl ConnectionRequest {
    /// Create a new pending request.
    pub fn new(
        from_user_id: impl Into<String>,
        to_user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            status: RequestStatus::Pending,
            created_at,
        }
    }

    /// Document id for the ordered pair. At most one request per ordered
    /// pair exists, so the id is derived rather than minted.
    pub fn doc_id(from_user_id: &str, to_user_id: &str) -> String {
        format!("{from_user_id}:{to_user_id}")
    }

    /// Whether the request is still awaiting a reply.
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Mark the request accepted. One-way: accepting twice is a no-op.
    pub fn accept(&mut self) {
        self.status = RequestStatus::Accepted;
    }
}

/// An established connection between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Minted identifier for the connection
    pub id: String,
    /// The two connected users, requester first
    pub participants: [String; 2],
    /// When the promotion happened
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    /// Create a connection from an accepted request.
    pub fn from_request(request: &ConnectionRequest, connected_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            participants: [request.from_user_id.clone(), request.to_user_id.clone()],
            connected_at,
        }
    }
}
