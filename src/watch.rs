//! Periodic refetch of the anomaly list
//!
//! Each cycle replaces the held snapshot through the coordinator. Failed
//! cycles keep the previous snapshot and back off exponentially, capped at
//! [`MAX_BACKOFF_SECS`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::ClassificationApi;
use crate::reclassify::ReclassificationCoordinator;

/// Longest wait between cycles after repeated failures.
pub const MAX_BACKOFF_SECS: u64 = 300;

const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub cycles: u64,
    pub failures: u64,
    /// Anomaly count after the last successful cycle
    pub last_count: Option<usize>,
}

/// Delay before the next cycle given the current failure streak.
pub fn next_delay(interval: Duration, consecutive_failures: u32) -> Duration {
    if consecutive_failures == 0 {
        return interval;
    }
    let backoff = 1u32 << consecutive_failures.min(MAX_BACKOFF_EXPONENT);
    interval
        .saturating_mul(backoff)
        .min(Duration::from_secs(MAX_BACKOFF_SECS))
}

/// Refresh every `interval` until `cancel` fires.
///
/// The first refresh runs immediately. An in-flight refresh is abandoned on
/// cancellation.
pub async fn run_watch<A: ClassificationApi>(
    coordinator: &ReclassificationCoordinator<A>,
    interval: Duration,
    cancel: CancellationToken,
) -> WatchSummary {
    let mut summary = WatchSummary::default();
    let mut consecutive_failures: u32 = 0;

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            r = coordinator.refresh() => r,
        };
        summary.cycles += 1;

        match result {
            Ok(count) => {
                let generation = coordinator.store().read().await.generation();
                info!(anomalies = count, generation, "Watch cycle complete");
                summary.last_count = Some(count);
                consecutive_failures = 0;
            }
            Err(e) => {
                summary.failures += 1;
                consecutive_failures = consecutive_failures.saturating_add(1);
                warn!(
                    error = %e,
                    consecutive_failures,
                    "Watch cycle failed, keeping previous snapshot"
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(next_delay(interval, consecutive_failures)) => {}
        }
    }

    info!(cycles = summary.cycles, failures = summary.failures, "Watch stopped");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_delay_backs_off_and_caps() {
        let interval = Duration::from_secs(10);
        assert_eq!(next_delay(interval, 0), interval);
        assert_eq!(next_delay(interval, 1), Duration::from_secs(20));
        assert_eq!(next_delay(interval, 3), Duration::from_secs(80));
        assert_eq!(next_delay(interval, 10), Duration::from_secs(MAX_BACKOFF_SECS));
    }
}
