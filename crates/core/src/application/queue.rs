// Offline Queue Core
//
// Lifecycle: Uninitialized -> Ready on the first operation (one load).
// Each operation holds the state lock across init, mutation and persist, so
// overlapping callers are serialized and the store always ends up holding
// the list as of the last completed operation.

use crate::application::store::QueueStore;
use crate::config::QueueConfig;
use crate::domain::{PendingQueue, QueuedRequest};
use crate::port::TimeProvider;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Initialization state of a queue instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
}

struct QueueState<D, C> {
    lifecycle: Lifecycle,
    pending: PendingQueue<D, C>,
}

/// Snapshot counters for operator tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub capacity: usize,
    pub oldest_timestamp: Option<i64>,
    pub newest_timestamp: Option<i64>,
}

pub struct OfflineQueue<D, C> {
    state: Mutex<QueueState<D, C>>,
    store: QueueStore<D, C>,
    time_provider: Arc<dyn TimeProvider>,
    max_entries: usize,
    default_max_age_ms: i64,
}

impl<D, C> OfflineQueue<D, C>
where
    D: Serialize + DeserializeOwned + Clone + Send,
    C: Serialize + DeserializeOwned + Clone + Send,
{
    pub fn new(store: QueueStore<D, C>, time_provider: Arc<dyn TimeProvider>, config: &QueueConfig) -> Self {
        Self {
            state: Mutex::new(QueueState {
                lifecycle: Lifecycle::Uninitialized,
                pending: PendingQueue::new(),
            }),
            store,
            time_provider,
            max_entries: config.max_entries,
            default_max_age_ms: config.default_max_age_ms,
        }
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.state.lock().await.lifecycle
    }

    /// Lock the state, loading from the store on first use
    async fn ready(&self) -> MutexGuard<'_, QueueState<D, C>> {
        let mut state = self.state.lock().await;
        if state.lifecycle == Lifecycle::Uninitialized {
            let entries = self.store.load().await;
            debug!(key = %self.store.key(), count = entries.len(), "Offline queue initialized");
            state.pending = PendingQueue::from_entries(entries);
            state.lifecycle = Lifecycle::Ready;
        }
        state
    }

    /// Force initialization without otherwise touching the queue
    pub async fn initialize(&self) {
        drop(self.ready().await);
    }

    pub async fn get_queue(&self) -> Vec<QueuedRequest<D, C>> {
        self.ready().await.pending.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.ready().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ready().await.pending.is_empty()
    }

    pub async fn add_to_queue(&self, request: QueuedRequest<D, C>) {
        let mut state = self.ready().await;

        let request_id = request.id.clone();
        let key = request.key();
        if let Some(replaced) = state.pending.upsert(request) {
            debug!(
                request_id = %request_id,
                replaced_id = %replaced.id,
                key = %key,
                "Replaced queued request with same key"
            );
        }

        let dropped = state.pending.enforce_capacity(self.max_entries);
        if dropped > 0 {
            warn!(
                dropped = dropped,
                max_entries = self.max_entries,
                "Offline queue over capacity, dropped oldest requests"
            );
        }

        self.store.save(state.pending.entries()).await;
    }

    pub async fn remove_from_queue(&self, id: &str) {
        let mut state = self.ready().await;

        let removed = state.pending.remove(id);
        debug!(request_id = %id, removed = removed, "Removed request from queue");

        self.store.save(state.pending.entries()).await;
    }

    pub async fn clear_queue(&self) {
        let mut state = self.ready().await;

        let cleared = state.pending.len();
        state.pending.clear();
        info!(cleared = cleared, "Offline queue cleared");

        self.store.save(state.pending.entries()).await;
    }

    pub async fn get_expired_requests(&self, max_age_ms: Option<i64>) -> Vec<QueuedRequest<D, C>> {
        let max_age_ms = max_age_ms.unwrap_or(self.default_max_age_ms);
        let state = self.ready().await;
        let now = self.time_provider.now_millis();
        state.pending.expired(now, max_age_ms)
    }

    /// Drop stale requests; no write happens when nothing expired
    pub async fn clean_expired_requests(&self, max_age_ms: Option<i64>) -> usize {
        let max_age_ms = max_age_ms.unwrap_or(self.default_max_age_ms);
        let mut state = self.ready().await;
        let now = self.time_provider.now_millis();

        let expired = state.pending.remove_expired(now, max_age_ms);
        if expired.is_empty() {
            return 0;
        }

        info!(
            removed = expired.len(),
            max_age_ms = max_age_ms,
            remaining = state.pending.len(),
            "Removed expired requests from offline queue"
        );

        self.store.save(state.pending.entries()).await;
        expired.len()
    }

    pub async fn stats(&self) -> QueueStats {
        let state = self.ready().await;
        QueueStats {
            pending: state.pending.len(),
            capacity: self.max_entries,
            oldest_timestamp: state.pending.oldest_timestamp(),
            newest_timestamp: state.pending.newest_timestamp(),
        }
    }
}
