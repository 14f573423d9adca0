// Retry policy for writes to the key-value store
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try the write again after this delay
    Retry(Duration),
    /// Give up; the failure is logged and absorbed
    GiveUp,
}

/// Exponential backoff around `QueueStore::save`
///
/// `max_attempts = 1` means a single try: a failed write is logged and the
/// queue moves on, the next successful save restores consistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistRetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt (ms)
    pub base_delay_ms: u64,

    /// Multiplier applied per further attempt
    pub backoff_factor: f64,
}

impl Default for PersistRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 25,
            backoff_factor: 2.0,
        }
    }
}

impl PersistRetryPolicy {
    /// Single attempt, no backoff
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Decide what to do after `failed_attempts` writes have failed
    ///
    /// Backoff formula:
    /// delay = base_delay * (backoff_factor ^ (failed_attempts - 1)) * (1.0 ± 0.1)
    ///
    /// `seed` makes the jitter deterministic per storage key.
    pub fn decide(&self, failed_attempts: u32, seed: &str) -> RetryDecision {
        if failed_attempts >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        let exponent = failed_attempts.saturating_sub(1) as i32;
        let base_delay_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);

        // ±10% jitter so several queues sharing a store don't retry in lockstep
        let jitter_seed = seed
            .chars()
            .fold(0u32, |acc, c| acc.wrapping_add(c as u32))
            .wrapping_add(failed_attempts);
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        RetryDecision::Retry(Duration::from_millis((base_delay_ms * jitter_factor) as u64))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.max_attempts == 0 {
            return Err(crate::AppError::Config(
                "persist_retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.backoff_factor.is_finite() && self.backoff_factor >= 1.0) {
            return Err(crate::AppError::Config(format!(
                "persist_retry.backoff_factor must be >= 1.0, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }
}
