// Expiry Sweeper
// Periodically removes stale requests so the queue does not carry week-old mutations

use crate::application::service::OfflineQueueService;
use crate::application::shutdown::ShutdownToken;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Background expiry loop over one queue
pub struct ExpirySweeper<D = serde_json::Value, C = serde_json::Value> {
    service: OfflineQueueService<D, C>,
    interval: Duration,
    max_age_ms: Option<i64>,
}

impl<D, C> ExpirySweeper<D, C>
where
    D: Serialize + DeserializeOwned + Clone + Send,
    C: Serialize + DeserializeOwned + Clone + Send,
{
    /// Create a new expiry sweeper
    ///
    /// # Arguments
    /// * `service` - Queue to sweep
    /// * `interval` - Time between sweeps (first sweep runs immediately)
    /// * `max_age_ms` - Age threshold; `None` uses the queue's configured default
    pub fn new(service: OfflineQueueService<D, C>, interval: Duration, max_age_ms: Option<i64>) -> Self {
        Self {
            service,
            interval,
            max_age_ms,
        }
    }

    /// Run a single sweep; returns the number of requests removed
    pub async fn run_once(&self) -> usize {
        let removed = self.service.clean_expired_requests(self.max_age_ms).await;
        if removed > 0 {
            info!(removed = removed, "Expiry sweep removed stale requests");
        } else {
            debug!("Expiry sweep found nothing to remove");
        }
        removed
    }

    /// Sweep every `interval` until `shutdown` fires
    ///
    /// Returns the total number of requests removed. Should be spawned with
    /// `tokio::spawn`.
    pub async fn run(self, mut shutdown: ShutdownToken) -> usize {
        info!(
            interval_secs = self.interval.as_secs(),
            max_age_ms = ?self.max_age_ms,
            "Expiry sweeper started"
        );

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut total = 0usize;

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tick.tick() => {
                    total += self.run_once().await;
                }
            }
        }

        info!(total_removed = total, "Expiry sweeper stopped");
        total
    }
}
