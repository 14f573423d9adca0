// Queue configuration (no magic values)

use crate::application::retry::PersistRetryPolicy;
use serde::{Deserialize, Serialize};

/// Key the serialized queue lives under in the key-value store
pub const DEFAULT_STORAGE_KEY: &str = "offline_queue";

/// Maximum number of pending requests kept (newest win)
pub const MAX_QUEUE_SIZE: usize = 100;

/// Default age after which a pending request is considered stale (7 days)
pub const DEFAULT_MAX_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Storage key holding the JSON array of queued requests
    pub storage_key: String,

    /// Capacity; older entries are dropped beyond this
    pub max_entries: usize,

    /// Age used by the expiry operations when the caller passes none
    pub default_max_age_ms: i64,

    /// Retry behaviour for failed writes to the store
    pub persist_retry: PersistRetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_entries: MAX_QUEUE_SIZE,
            default_max_age_ms: DEFAULT_MAX_AGE_MS,
            persist_retry: PersistRetryPolicy::default(),
        }
    }
}

impl QueueConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_persist_retry(mut self, policy: PersistRetryPolicy) -> Self {
        self.persist_retry = policy;
        self
    }

    /// Reject settings the queue cannot operate with
    pub fn validate(&self) -> crate::Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(crate::AppError::Config(
                "storage_key cannot be empty".to_string(),
            ));
        }
        if self.max_entries == 0 {
            return Err(crate::AppError::Config(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.default_max_age_ms < 0 {
            return Err(crate::AppError::Config(format!(
                "default_max_age_ms must be non-negative, got {}",
                self.default_max_age_ms
            )));
        }
        self.persist_retry.validate()
    }
}
