// Offline Queue Service - public surface for callers (HTTP client wrappers, sync managers)

use crate::application::queue::{Lifecycle, OfflineQueue, QueueStats};
use crate::application::store::QueueStore;
use crate::config::QueueConfig;
use crate::domain::{EnqueueRequest, QueuedRequest, RequestId};
use crate::error::Result;
use crate::port::{IdProvider, KeyValueStore, TimeProvider};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Handle to one offline queue.
///
/// Build it once in the composition root and hand clones to whoever needs
/// to enqueue or drain; every clone talks to the same queue. Construction
/// does no I/O, the persisted list is loaded by the first operation.
///
/// Callers that replay requests are expected to iterate `get_queue()`,
/// attempt delivery, and `remove_from_queue(id)` on success.
pub struct OfflineQueueService<D = serde_json::Value, C = serde_json::Value> {
    queue: Arc<OfflineQueue<D, C>>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl<D, C> Clone for OfflineQueueService<D, C> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            id_provider: Arc::clone(&self.id_provider),
            time_provider: Arc::clone(&self.time_provider),
        }
    }
}

impl<D, C> OfflineQueueService<D, C>
where
    D: Serialize + DeserializeOwned + Clone + Send,
    C: Serialize + DeserializeOwned + Clone + Send,
{
    /// Create a new queue service
    ///
    /// # Arguments
    ///
    /// * `kv` - Key-value store the queue persists into
    /// * `id_provider` - ID generator (injected for determinism)
    /// * `time_provider` - Clock (injected for determinism)
    /// * `config` - Storage key, capacity, expiry and retry settings
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: QueueConfig,
    ) -> Result<Self> {
        config.validate()?;

        let store = QueueStore::new(kv, config.storage_key.clone(), config.persist_retry.clone());
        let queue = OfflineQueue::new(store, time_provider.clone(), &config);

        Ok(Self {
            queue: Arc::new(queue),
            id_provider,
            time_provider,
        })
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.queue.lifecycle().await
    }

    /// Load the persisted list now instead of on first use
    pub async fn initialize(&self) {
        self.queue.initialize().await
    }

    /// Owned copy of the pending list
    pub async fn get_queue(&self) -> Vec<QueuedRequest<D, C>> {
        self.queue.get_queue().await
    }

    /// Insert or replace by (method, endpoint); never fails
    pub async fn add_to_queue(&self, request: QueuedRequest<D, C>) {
        self.queue.add_to_queue(request).await
    }

    /// Stamp a new request with an ID and the current time, then queue it
    pub async fn enqueue(&self, req: EnqueueRequest<D, C>) -> RequestId {
        let id = self.id_provider.generate_id();
        let timestamp = self.time_provider.now_millis();

        self.queue
            .add_to_queue(req.into_queued(id.clone(), timestamp))
            .await;

        id
    }

    /// Remove by ID; unknown IDs are a no-op (the list is still persisted)
    pub async fn remove_from_queue(&self, id: &str) {
        self.queue.remove_from_queue(id).await
    }

    pub async fn clear_queue(&self) {
        self.queue.clear_queue().await
    }

    /// Requests older than `max_age_ms` (default 7 days), without removing them
    pub async fn get_expired_requests(&self, max_age_ms: Option<i64>) -> Vec<QueuedRequest<D, C>> {
        self.queue.get_expired_requests(max_age_ms).await
    }

    /// Remove requests older than `max_age_ms` (default 7 days); returns how many
    pub async fn clean_expired_requests(&self, max_age_ms: Option<i64>) -> usize {
        self.queue.clean_expired_requests(max_age_ms).await
    }

    pub async fn len(&self) -> usize {
        self.queue.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.is_empty().await
    }

    pub async fn stats(&self) -> QueueStats {
        self.queue.stats().await
    }
}
