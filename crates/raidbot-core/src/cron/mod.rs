//! Scheduled refresh of the game data cache.
//!
//! The job waits a startup delay, refreshes once, then refreshes on every
//! tick of a cron expression (`0 0 */6 * * *` = every six hours, seconds
//! field first). Overlapping runs are skipped.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::data::SharedData;

/// Result of one [`RefreshJob::run_once`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Refreshed,
    Failed,
    /// Another run was still in progress.
    Skipped,
}

pub struct RefreshJob {
    schedule: cron::Schedule,
    expression: String,
    startup_delay: Duration,
    data: SharedData,
    running: Arc<AtomicBool>,
}

impl RefreshJob {
    /// Build a job from a cron expression.
    pub fn new(expression: &str, startup_delay: Duration, data: SharedData) -> anyhow::Result<Self> {
        let schedule = cron::Schedule::from_str(expression)
            .map_err(|e| anyhow::anyhow!("Invalid cron expression '{}': {}", expression, e))?;

        Ok(Self {
            schedule,
            expression: expression.to_string(),
            startup_delay,
            data,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Next tick strictly after `after`.
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Refresh the cache now unless a run is already in progress.
    pub async fn run_once(&self) -> RunOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Data refresh already in progress, skipping");
            return RunOutcome::Skipped;
        }

        let outcome = match self.data.refresh(Utc::now()).await {
            Ok(()) => RunOutcome::Refreshed,
            Err(_) => RunOutcome::Failed,
        };

        self.running.store(false, Ordering::Release);
        outcome
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            schedule = %self.expression,
            startup_delay_secs = self.startup_delay.as_secs(),
            "Scheduled data refresh started"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Scheduled data refresh cancelled");
                return;
            }
            _ = tokio::time::sleep(self.startup_delay) => {
                self.run_once().await;
            }
        }

        loop {
            let now = Utc::now();
            let Some(next) = self.next_run_after(now) else {
                warn!(schedule = %self.expression, "Cron schedule has no upcoming runs, stopping");
                return;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Scheduled data refresh cancelled");
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    self.run_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContextProvider;
    use chrono::TimeZone;

    fn data() -> SharedData {
        SharedData::curated(chrono::Duration::hours(6))
    }

    #[test]
    fn test_rejects_bad_expression() {
        assert!(RefreshJob::new("every six hours", Duration::ZERO, data()).is_err());
    }

    #[test]
    fn test_six_hourly_ticks() {
        let job = RefreshJob::new("0 0 */6 * * *", Duration::ZERO, data()).unwrap();
        let t = Utc.with_ymd_and_hms(2025, 6, 15, 7, 30, 0).unwrap();

        assert_eq!(
            job.next_run_after(t),
            Some(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_run_once_refreshes() {
        let shared = data();
        let job = RefreshJob::new("0 0 */6 * * *", Duration::ZERO, shared.clone()).unwrap();

        assert_eq!(job.run_once().await, RunOutcome::Refreshed);
        assert!(!shared.snapshot().await.events.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_run_is_skipped() {
        let job = RefreshJob::new("0 0 */6 * * *", Duration::ZERO, data()).unwrap();
        job.running.store(true, Ordering::Release);
        assert_eq!(job.run_once().await, RunOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_startup_refresh_then_cancel() {
        let shared = data();
        let job = RefreshJob::new("0 0 */6 * * *", Duration::from_millis(10), shared.clone()).unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(job.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!shared.snapshot().await.events.is_empty());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("job did not stop after cancel")
            .unwrap();
    }
}
