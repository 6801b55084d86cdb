//! Notification threshold policy.
//!
//! The policy is a pure decision function: given the current engagement
//! metadata for a post and the actor who just engaged, it computes the
//! updated metadata and decides whether an immediate notification should go
//! out, be deferred to the next digest sweep, or be suppressed entirely.
//!
//! Only the very first engagement from someone other than the author fires an
//! immediate notification. Everything after that is merely flagged via
//! `scheduled` for the periodic digest, which keeps a burst of likes from
//! turning into a notification storm.

use crate::domain::engagement::EngagementMeta;
use chrono::{DateTime, Utc};

/// Decision made by the notification threshold policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationDecision {
    /// Send an immediate notification now
    SendNow,
    /// Flag the post for the next digest sweep instead of notifying now
    Defer,
    /// No notification activity at all
    Suppress,
}

impl NotificationDecision {
    /// Check if this decision is SendNow.
    pub fn is_send_now(&self) -> bool {
        matches!(self, NotificationDecision::SendNow)
    }

    /// Check if this decision is Defer.
    pub fn is_defer(&self) -> bool {
        matches!(self, NotificationDecision::Defer)
    }

    /// Check if this decision is Suppress.
    pub fn is_suppress(&self) -> bool {
        matches!(self, NotificationDecision::Suppress)
    }
}

/// Result of running the policy: the metadata to persist and the decision.
///
/// Callers persist `meta` regardless of the decision and dispatch a
/// notification only on [`NotificationDecision::SendNow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOutcome {
    /// Updated metadata to write back to the post
    pub meta: EngagementMeta,
    /// What to do about notifying the author
    pub decision: NotificationDecision,
}

/// Decide how to handle a new engagement.
///
/// Pure function, no I/O. The same inputs always produce the same outcome.
///
/// # Arguments
/// * `meta` - Current engagement metadata for the relevant kind
/// * `actor_id` - User who performed the engagement
/// * `author_id` - Author of the post
/// * `now` - Transaction timestamp, recorded as the notification time on SendNow
pub fn decide(
    meta: &EngagementMeta,
    actor_id: &str,
    author_id: &str,
    now: DateTime<Utc>,
) -> PolicyOutcome {
    // Self-engagement never notifies and never counts toward by-others totals.
    if actor_id == author_id {
        return PolicyOutcome {
            meta: meta.clone(),
            decision: NotificationDecision::Suppress,
        };
    }

    let mut next = meta.clone();
    let was_zero = next.total_by_others == 0;
    next.total_by_others = next.total_by_others.saturating_add(1);

    if was_zero && next.last_notified_at.is_none() {
        // First-ever engagement by others: the "someone liked/commented"
        // single-actor notification.
        next.last_notified_at = Some(now);
        next.last_total_when_notified = 1;
        return PolicyOutcome {
            meta: next,
            decision: NotificationDecision::SendNow,
        };
    }

    // Externally reset counters land here too: a stale last_notified_at with
    // total_by_others back at zero must not fire again or panic.
    if next.total_by_others != next.last_total_when_notified && next.total_by_others != 1 {
        next.scheduled = true;
        PolicyOutcome {
            meta: next,
            decision: NotificationDecision::Defer,
        }
    } else {
        PolicyOutcome {
            meta: next,
            decision: NotificationDecision::Suppress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_self_engagement_suppresses_without_touching_meta() {
        let meta = EngagementMeta {
            total: 4,
            total_by_others: 2,
            last_total_when_notified: 1,
            last_notified_at: Some(at(100)),
            scheduled: false,
        };

        let outcome = decide(&meta, "alice", "alice", at(200));

        assert_eq!(outcome.decision, NotificationDecision::Suppress);
        assert_eq!(outcome.meta, meta);
    }

    #[test]
    fn test_first_engagement_by_other_sends_now() {
        let outcome = decide(&EngagementMeta::new(), "bob", "alice", at(100));

        assert_eq!(outcome.decision, NotificationDecision::SendNow);
        assert_eq!(outcome.meta.total_by_others, 1);
        assert_eq!(outcome.meta.last_total_when_notified, 1);
        assert_eq!(outcome.meta.last_notified_at, Some(at(100)));
        assert!(!outcome.meta.scheduled);
    }

    #[test]
    fn test_second_engagement_defers() {
        let first = decide(&EngagementMeta::new(), "bob", "alice", at(100));
        let second = decide(&first.meta, "carol", "alice", at(150));

        assert_eq!(second.decision, NotificationDecision::Defer);
        assert_eq!(second.meta.total_by_others, 2);
        assert!(second.meta.scheduled);
        // First-notification bookkeeping is untouched by the deferral.
        assert_eq!(second.meta.last_total_when_notified, 1);
        assert_eq!(second.meta.last_notified_at, Some(at(100)));
    }

    #[test]
    fn test_engagement_matching_notified_total_suppresses() {
        // by-others will land exactly on last_total_when_notified after the
        // increment, so there is nothing new to digest.
        let meta = EngagementMeta {
            total: 3,
            total_by_others: 2,
            last_total_when_notified: 3,
            last_notified_at: Some(at(100)),
            scheduled: false,
        };

        let outcome = decide(&meta, "bob", "alice", at(200));

        assert_eq!(outcome.decision, NotificationDecision::Suppress);
        assert_eq!(outcome.meta.total_by_others, 3);
        assert!(!outcome.meta.scheduled);
    }

    #[test]
    fn test_externally_reset_counters_do_not_refire() {
        // total_by_others was reset to zero but a notification was already
        // sent once. Must not send again and must not panic.
        let meta = EngagementMeta {
            total: 0,
            total_by_others: 0,
            last_total_when_notified: 5,
            last_notified_at: Some(at(100)),
            scheduled: false,
        };

        let outcome = decide(&meta, "bob", "alice", at(200));

        assert_ne!(outcome.decision, NotificationDecision::SendNow);
        assert_eq!(outcome.meta.total_by_others, 1);
        // Post-increment count is exactly 1, so it is suppressed, not deferred.
        assert_eq!(outcome.decision, NotificationDecision::Suppress);
    }

    #[test]
    fn test_policy_is_deterministic() {
        let meta = EngagementMeta {
            total: 9,
            total_by_others: 7,
            last_total_when_notified: 1,
            last_notified_at: Some(at(50)),
            scheduled: false,
        };

        let a = decide(&meta, "bob", "alice", at(300));
        let b = decide(&meta, "bob", "alice", at(300));

        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_first_like_outcome() {
        // decide({by_others: 0, last_notified: None}, actor != author, now=T)
        // == {by_others: 1, last_notified: T, last_total: 1, scheduled: false}, SendNow
        let outcome = decide(&EngagementMeta::new(), "bob", "alice", at(42));

        assert_eq!(
            outcome,
            PolicyOutcome {
                meta: EngagementMeta {
                    total: 0,
                    total_by_others: 1,
                    last_total_when_notified: 1,
                    last_notified_at: Some(at(42)),
                    scheduled: false,
                },
                decision: NotificationDecision::SendNow,
            }
        );
    }

    #[test]
    fn test_defer_keeps_scheduled_sticky() {
        let meta = EngagementMeta {
            total: 5,
            total_by_others: 4,
            last_total_when_notified: 1,
            last_notified_at: Some(at(100)),
            scheduled: true,
        };

        let outcome = decide(&meta, "bob", "alice", at(200));

        assert_eq!(outcome.decision, NotificationDecision::Defer);
        assert!(outcome.meta.scheduled);
    }
}
