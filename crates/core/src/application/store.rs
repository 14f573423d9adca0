// Persistent Store Adapter
// Saves/restores the whole queue as one JSON array under a fixed key

use crate::application::retry::{PersistRetryPolicy, RetryDecision};
use crate::domain::QueuedRequest;
use crate::port::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Best-effort persistence of the pending list
///
/// Neither `load` nor `save` fails the caller: read and decode problems
/// degrade to an empty list, write problems are retried per policy and then
/// logged.
pub struct QueueStore<D, C> {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    retry: PersistRetryPolicy,
    _marker: PhantomData<fn() -> (D, C)>,
}

impl<D, C> QueueStore<D, C>
where
    D: Serialize + DeserializeOwned,
    C: Serialize + DeserializeOwned,
{
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>, retry: PersistRetryPolicy) -> Self {
        Self {
            kv,
            key: key.into(),
            retry,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Restore the persisted list; anything unreadable counts as "no data"
    pub async fn load(&self) -> Vec<QueuedRequest<D, C>> {
        let raw = match self.kv.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No persisted queue found");
                return Vec::new();
            }
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to read persisted queue");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<QueuedRequest<D, C>>>(&raw) {
            Ok(entries) => {
                debug!(key = %self.key, count = entries.len(), "Loaded persisted queue");
                entries
            }
            Err(e) => {
                error!(
                    key = %self.key,
                    error = %e,
                    bytes = raw.len(),
                    "Persisted queue is corrupt, starting empty"
                );
                Vec::new()
            }
        }
    }

    /// Rewrite the full list; returns whether the write landed
    pub async fn save(&self, entries: &[QueuedRequest<D, C>]) -> bool {
        let raw = match serde_json::to_string(entries) {
            Ok(raw) => raw,
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to serialize queue");
                return false;
            }
        };

        let mut failed_attempts = 0u32;
        loop {
            match self.kv.set(&self.key, &raw).await {
                Ok(()) => {
                    debug!(key = %self.key, count = entries.len(), "Persisted queue");
                    return true;
                }
                Err(e) => {
                    failed_attempts += 1;
                    match self.retry.decide(failed_attempts, &self.key) {
                        RetryDecision::Retry(delay) => {
                            warn!(
                                key = %self.key,
                                attempt = failed_attempts,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                "Queue write failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::GiveUp => {
                            error!(
                                key = %self.key,
                                attempts = failed_attempts,
                                count = entries.len(),
                                error = %e,
                                "Failed to persist queue, keeping in-memory state"
                            );
                            return false;
                        }
                    }
                }
            }
        }
    }
}
