//! Observability metrics for the engagement pipeline.
//!
//! Provides counters about processing and notification behavior for
//! monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking engagement processing statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Metrics are collected throughout the pipeline and can be queried at any
/// time for observability.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Engagement events whose counter transaction committed
    events_processed: AtomicU64,
    /// Immediate notifications recorded (SendNow decisions)
    notifications_sent: AtomicU64,
    /// Engagements flagged for the digest sweep (Defer decisions)
    notifications_deferred: AtomicU64,
    /// Engagements with no notification activity (Suppress decisions)
    notifications_suppressed: AtomicU64,
    /// Relational mirror writes that failed and were queued for replay
    mirror_failures: AtomicU64,
    /// Failed-sync entries successfully replayed
    entries_replayed: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                events_processed: AtomicU64::new(0),
                notifications_sent: AtomicU64::new(0),
                notifications_deferred: AtomicU64::new(0),
                notifications_suppressed: AtomicU64::new(0),
                mirror_failures: AtomicU64::new(0),
                entries_replayed: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_processed(&self) {
        self.inner.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.inner
            .notifications_sent
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deferred(&self) {
        self.inner
            .notifications_deferred
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.inner
            .notifications_suppressed
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_mirror_failure(&self) {
        self.inner.mirror_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_replayed(&self) {
        self.inner.entries_replayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Engagement events whose counter transaction committed.
    pub fn events_processed(&self) -> u64 {
        self.inner.events_processed.load(Ordering::Relaxed)
    }

    /// Immediate notifications recorded.
    pub fn notifications_sent(&self) -> u64 {
        self.inner.notifications_sent.load(Ordering::Relaxed)
    }

    /// Engagements flagged for the digest sweep.
    pub fn notifications_deferred(&self) -> u64 {
        self.inner.notifications_deferred.load(Ordering::Relaxed)
    }

    /// Engagements with no notification activity.
    pub fn notifications_suppressed(&self) -> u64 {
        self.inner.notifications_suppressed.load(Ordering::Relaxed)
    }

    /// Relational mirror writes queued for replay.
    pub fn mirror_failures(&self) -> u64 {
        self.inner.mirror_failures.load(Ordering::Relaxed)
    }

    /// Failed-sync entries successfully replayed.
    pub fn entries_replayed(&self) -> u64 {
        self.inner.entries_replayed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_processed: self.events_processed(),
            notifications_sent: self.notifications_sent(),
            notifications_deferred: self.notifications_deferred(),
            notifications_suppressed: self.notifications_suppressed(),
            mirror_failures: self.mirror_failures(),
            entries_replayed: self.entries_replayed(),
        }
    }

    /// Reset all metrics to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        self.inner.events_processed.store(0, Ordering::Relaxed);
        self.inner.notifications_sent.store(0, Ordering::Relaxed);
        self.inner.notifications_deferred.store(0, Ordering::Relaxed);
        self.inner
            .notifications_suppressed
            .store(0, Ordering::Relaxed);
        self.inner.mirror_failures.store(0, Ordering::Relaxed);
        self.inner.entries_replayed.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Engagement events whose counter transaction committed
    pub events_processed: u64,
    /// Immediate notifications recorded
    pub notifications_sent: u64,
    /// Engagements flagged for the digest sweep
    pub notifications_deferred: u64,
    /// Engagements with no notification activity
    pub notifications_suppressed: u64,
    /// Relational mirror writes queued for replay
    pub mirror_failures: u64,
    /// Failed-sync entries successfully replayed
    pub entries_replayed: u64,
}

impl MetricsSnapshot {
    /// Total notification decisions recorded.
    pub fn total_decisions(&self) -> u64 {
        self.notifications_sent + self.notifications_deferred + self.notifications_suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counting() {
        let metrics = Metrics::new();

        metrics.record_processed();
        metrics.record_processed();
        metrics.record_sent();
        metrics.record_deferred();
        metrics.record_suppressed();
        metrics.record_mirror_failure();
        metrics.record_replayed();

        assert_eq!(metrics.events_processed(), 2);
        assert_eq!(metrics.notifications_sent(), 1);
        assert_eq!(metrics.notifications_deferred(), 1);
        assert_eq!(metrics.notifications_suppressed(), 1);
        assert_eq!(metrics.mirror_failures(), 1);
        assert_eq!(metrics.entries_replayed(), 1);
    }

    #[test]
    fn test_snapshot_totals() {
        let metrics = Metrics::new();
        metrics.record_sent();
        metrics.record_deferred();
        metrics.record_deferred();
        metrics.record_suppressed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_decisions(), 4);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        clone.record_processed();
        assert_eq!(metrics.events_processed(), 1);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_processed();
        metrics.record_sent();

        metrics.reset();
        assert_eq!(metrics.snapshot(), Metrics::new().snapshot());
    }
}
