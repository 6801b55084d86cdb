//! Periodic replay of failed mirror writes.
//!
//! The scheduler drains the [`FailedSyncRegistry`] in capped batches on a
//! fixed interval, fully decoupled from the request-time handlers. Each pass
//! makes exactly one attempt per entry: success deletes the entry, failure
//! leaves it for the next pass. Replaying is idempotent because mirror rows
//! are keyed by the original external id, so a concurrent pass that already
//! drained an entry is harmless.

use crate::application::metrics::Metrics;
use crate::application::ports::{MirrorError, RelationalMirror};
use crate::application::sync_registry::FailedSyncRegistry;
use crate::domain::sync::{FailedSyncEntry, SyncDocType};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Error returned when replay configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayConfigError {
    /// Replay interval duration must be greater than zero
    #[error("replay interval must be greater than 0")]
    ZeroInterval,
    /// Batch size must be greater than zero
    #[error("batch size must be greater than 0")]
    ZeroBatchSize,
}

/// Configuration for the replay scheduler.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// How often to run a replay pass
    pub interval: Duration,
    /// Maximum entries handled per batch, to respect store limits
    pub batch_size: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            batch_size: 500,
        }
    }
}

impl ReplayConfig {
    /// Create a replay config.
    ///
    /// # Errors
    /// Returns [`ReplayConfigError::ZeroInterval`] if `interval` is zero and
    /// [`ReplayConfigError::ZeroBatchSize`] if `batch_size` is zero.
    pub fn new(interval: Duration, batch_size: usize) -> Result<Self, ReplayConfigError> {
        if interval.is_zero() {
            return Err(ReplayConfigError::ZeroInterval);
        }
        if batch_size == 0 {
            return Err(ReplayConfigError::ZeroBatchSize);
        }
        Ok(Self {
            interval,
            batch_size,
        })
    }
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Entries attempted in this pass
    pub attempted: usize,
    /// Entries successfully re-applied and deleted
    pub replayed: usize,
    /// Entries that failed and were left for the next pass
    pub failed: usize,
}

/// Drains the failed-sync registry against the relational mirror.
#[derive(Debug, Clone)]
pub struct ReplayScheduler {
    registry: FailedSyncRegistry,
    mirror: Arc<dyn RelationalMirror>,
    metrics: Metrics,
    config: ReplayConfig,
}

impl ReplayScheduler {
    /// Create a scheduler.
    pub fn new(
        registry: FailedSyncRegistry,
        mirror: Arc<dyn RelationalMirror>,
        metrics: Metrics,
        config: ReplayConfig,
    ) -> Self {
        Self {
            registry,
            mirror,
            metrics,
            config,
        }
    }

    /// Run one replay pass over all registered entries.
    pub async fn replay_all(&self) -> ReplayReport {
        let entries = match self.registry.entries().await {
            Ok(entries) => entries,
            Err(err) => {
                error!(error = %err, "failed to list sync retry entries; skipping pass");
                return ReplayReport::default();
            }
        };

        let mut report = ReplayReport::default();
        for batch in entries.chunks(self.config.batch_size) {
            for entry in batch {
                report.attempted += 1;
                match self.apply(entry).await {
                    Ok(()) => {
                        if let Err(err) = self.registry.remove(&entry.id).await {
                            // The row is applied; the entry will be replayed
                            // again next pass, which is safe.
                            warn!(
                                entry_id = %entry.id,
                                error = %err,
                                "replayed entry could not be deleted"
                            );
                        }
                        report.replayed += 1;
                        self.metrics.record_replayed();
                    }
                    Err(err) => {
                        report.failed += 1;
                        warn!(
                            entry_id = %entry.id,
                            doc_type = %entry.doc_type,
                            error = %err,
                            "replay failed; leaving entry for next pass"
                        );
                    }
                }
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                replayed = report.replayed,
                failed = report.failed,
                "replay pass complete"
            );
        }
        report
    }

    /// Re-apply one entry to the mirror, dispatching on its document type.
    async fn apply(&self, entry: &FailedSyncEntry) -> Result<(), MirrorError> {
        let payload = entry.payload.clone();
        match entry.doc_type {
            SyncDocType::User => {
                self.mirror
                    .upsert(SyncDocType::User, &entry.document_id, payload)
                    .await
            }
            SyncDocType::Post | SyncDocType::Comment | SyncDocType::Like => {
                self.mirror
                    .insert(entry.doc_type, &entry.document_id, payload)
                    .await
            }
            SyncDocType::NotificationToken => {
                self.mirror
                    .update(SyncDocType::NotificationToken, &entry.document_id, payload)
                    .await
            }
        }
    }

    /// Start running replay passes on the configured interval.
    ///
    /// This spawns a background task; the first pass runs immediately.
    pub fn start(self) -> ReplayHandle {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);
            loop {
                ticker.tick().await;
                self.replay_all().await;
            }
        });
        ReplayHandle { handle }
    }
}

/// Handle to a running replay task.
#[derive(Debug)]
pub struct ReplayHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl ReplayHandle {
    /// Stop the replay task. Any pass in flight is aborted; entries it had
    /// not yet drained remain queued.
    pub fn shutdown(self) {
        self.handle.abort();
    }

    /// Whether the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
