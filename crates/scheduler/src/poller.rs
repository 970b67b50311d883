//! The periodic poller.
//!
//! A timer-driven loop: release expired leases, collect due jobs, claim
//! and dispatch each one. Per-job failures are logged and never abort
//! the rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use database::{scheduled_message, Database};
use dispatcher::MessageSender;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::dispatch::{run_job, DispatchResult};
use crate::error::Result;

/// Configuration for the poller loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between scans of the queue.
    pub poll_interval: Duration,
    /// Maximum jobs claimed per scan.
    pub batch_size: i64,
    /// How long a claim protects a job before it is considered crashed.
    pub lease_duration: chrono::Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            batch_size: 50,
            lease_duration: chrono::Duration::minutes(5),
        }
    }
}

/// Outcome counts for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Jobs delivered.
    pub sent: usize,
    /// Jobs pushed past the messaging-hours window.
    pub deferred: usize,
    /// Jobs requeued for retry.
    pub retrying: usize,
    /// Jobs that exhausted their retries.
    pub failed: usize,
    /// Jobs lost to another claimer.
    pub skipped: usize,
    /// Crashed claims returned to pending before the scan.
    pub released: u64,
}

/// The scheduler poller.
pub struct Poller {
    db: Database,
    sender: Arc<dyn MessageSender>,
    config: PollerConfig,
}

impl Poller {
    /// Create a poller.
    pub fn new(db: Database, sender: Arc<dyn MessageSender>, config: PollerConfig) -> Self {
        Self { db, sender, config }
    }

    /// Run the poll loop forever.
    pub async fn run(self) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            batch_size = self.config.batch_size,
            "Scheduler poller started"
        );

        let mut timer = interval(self.config.poll_interval);
        loop {
            timer.tick().await;

            match self.run_batch().await {
                Ok(stats) => {
                    if stats != BatchStats::default() {
                        info!(
                            sent = stats.sent,
                            deferred = stats.deferred,
                            retrying = stats.retrying,
                            failed = stats.failed,
                            skipped = stats.skipped,
                            released = stats.released,
                            "Poll cycle complete"
                        );
                    } else {
                        debug!("Poll cycle complete; queue idle");
                    }
                }
                // A failed scan (e.g. store unavailable) must not kill
                // the loop; the next tick tries again.
                Err(e) => error!(error = %e, "Poll cycle failed"),
            }
        }
    }

    /// Run one scan of the queue.
    pub async fn run_batch(&self) -> Result<BatchStats> {
        let pool = self.db.pool();
        let now = Utc::now();
        let mut stats = BatchStats {
            released: scheduled_message::release_expired_leases(pool, now).await?,
            ..BatchStats::default()
        };

        let due = scheduled_message::find_due(pool, now, self.config.batch_size).await?;
        debug!(due = due.len(), "Scanned queue");

        for job in &due {
            match run_job(pool, self.sender.as_ref(), job, self.config.lease_duration, now).await {
                Ok(DispatchResult::Sent { .. }) => stats.sent += 1,
                Ok(DispatchResult::Deferred { .. }) => stats.deferred += 1,
                Ok(DispatchResult::Retrying { .. }) => stats.retrying += 1,
                Ok(DispatchResult::Failed { .. }) => stats.failed += 1,
                Ok(DispatchResult::Skipped) => stats.skipped += 1,
                Err(e) => {
                    error!(job_id = %job.id, error = %e, "Job dispatch errored");
                }
            }
        }

        Ok(stats)
    }
}
