//! Unit tests for queue semantics through the public service

use super::*;
use crate::config::{QueueConfig, DEFAULT_MAX_AGE_MS};
use crate::domain::{EnqueueRequest, HttpMethod, QueuedRequest};
use crate::error::AppError;
use crate::port::key_value_store::MockKeyValueStore;
use crate::port::{
    InMemoryKeyValueStore, KeyValueStore, ManualTimeProvider, SequentialIdProvider,
    TimeProvider, UuidProvider,
};
use serde_json::{json, Value};
use std::sync::Arc;

const T0: i64 = 1_700_000_000_000;

struct Harness {
    kv: Arc<InMemoryKeyValueStore>,
    clock: Arc<ManualTimeProvider>,
    service: OfflineQueueService,
}

fn harness() -> Harness {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let clock = Arc::new(ManualTimeProvider::new(T0));
    let service = service_over(kv.clone(), clock.clone());
    Harness { kv, clock, service }
}

fn service_over(kv: Arc<dyn KeyValueStore>, clock: Arc<ManualTimeProvider>) -> OfflineQueueService {
    OfflineQueueService::new(
        kv,
        Arc::new(SequentialIdProvider::new("req")),
        clock,
        QueueConfig::default().with_persist_retry(PersistRetryPolicy::no_retry()),
    )
    .unwrap()
}

fn booking(id: &str, property: &str, ts: i64) -> QueuedRequest {
    QueuedRequest::new(id, HttpMethod::Post, "/bookings", ts).with_data(json!({ "propertyId": property }))
}

async fn persisted(kv: &InMemoryKeyValueStore) -> Option<Vec<QueuedRequest>> {
    kv.get("offline_queue")
        .await
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

#[tokio::test]
async fn test_same_key_last_write_wins() {
    let h = harness();

    h.service.add_to_queue(booking("a", "42", T0)).await;
    h.service.add_to_queue(booking("b", "43", T0 + 10)).await;

    let queue = h.service.get_queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, "b");
    assert_eq!(queue[0].data.as_ref().unwrap()["propertyId"], "43");
    assert_eq!(persisted(&h.kv).await.unwrap(), queue);
}

#[tokio::test]
async fn test_capacity_keeps_newest_hundred() {
    let h = harness();

    for i in 0..101 {
        let req = QueuedRequest::new(format!("r{i}"), HttpMethod::Put, format!("/listings/{i}"), T0 + i);
        h.service.add_to_queue(req).await;
    }

    let queue = h.service.get_queue().await;
    assert_eq!(queue.len(), 100);
    assert!(queue.iter().all(|r| r.id != "r0"));
    for i in 1..101 {
        assert!(queue.iter().any(|r| r.id == format!("r{i}")));
    }
    assert_eq!(persisted(&h.kv).await.unwrap().len(), 100);
}

#[tokio::test]
async fn test_remove_unknown_id_changes_nothing() {
    let h = harness();
    h.service.add_to_queue(booking("a", "42", T0)).await;
    let before = h.service.get_queue().await;

    h.service.remove_from_queue("does-not-exist").await;

    assert_eq!(h.service.get_queue().await, before);
    assert_eq!(persisted(&h.kv).await.unwrap(), before);
}

#[tokio::test]
async fn test_remove_known_id() {
    let h = harness();
    h.service.add_to_queue(booking("a", "42", T0)).await;
    h.service
        .add_to_queue(QueuedRequest::new("f", HttpMethod::Delete, "/favorites/9", T0))
        .await;

    h.service.remove_from_queue("a").await;

    let queue = h.service.get_queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, "f");
}

#[tokio::test]
async fn test_expiry_boundary() {
    let h = harness();
    let max_age = 60_000;
    let now = h.clock.now_millis();

    h.service
        .add_to_queue(QueuedRequest::new("stale", HttpMethod::Post, "/a", now - max_age - 1))
        .await;
    h.service
        .add_to_queue(QueuedRequest::new("fresh", HttpMethod::Post, "/b", now - max_age + 1))
        .await;

    let expired = h.service.get_expired_requests(Some(max_age)).await;
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, "stale");
    // Read-only
    assert_eq!(h.service.len().await, 2);
}

#[tokio::test]
async fn test_default_max_age_is_seven_days() {
    let h = harness();
    h.service.add_to_queue(booking("a", "42", T0)).await;

    h.clock.advance(DEFAULT_MAX_AGE_MS);
    assert!(h.service.get_expired_requests(None).await.is_empty());

    h.clock.advance(1);
    assert_eq!(h.service.get_expired_requests(None).await.len(), 1);
    assert_eq!(h.service.clean_expired_requests(None).await, 1);
    assert!(h.service.is_empty().await);
    assert_eq!(persisted(&h.kv).await.unwrap(), vec![]);
}

#[tokio::test]
async fn test_persistence_round_trip_across_instances() {
    let h = harness();
    let req = booking("a", "42", T0);
    h.service.add_to_queue(req.clone()).await;

    let fresh = service_over(h.kv.clone(), h.clock.clone());
    assert_eq!(fresh.lifecycle().await, Lifecycle::Uninitialized);

    let queue = fresh.get_queue().await;
    assert_eq!(queue, vec![req]);
    assert_eq!(fresh.lifecycle().await, Lifecycle::Ready);
}

#[tokio::test]
async fn test_clear_persists_empty_array() {
    let h = harness();
    h.service.add_to_queue(booking("a", "42", T0)).await;

    h.service.clear_queue().await;

    assert!(h.service.get_queue().await.is_empty());
    let raw = h.kv.get("offline_queue").await.unwrap().unwrap();
    assert_eq!(raw, "[]");
}

#[tokio::test]
async fn test_get_queue_returns_detached_copy() {
    let h = harness();
    h.service.add_to_queue(booking("a", "42", T0)).await;

    let mut copy = h.service.get_queue().await;
    copy[0].endpoint = "/tampered".to_string();
    copy.clear();

    let queue = h.service.get_queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].endpoint, "/bookings");
}

#[tokio::test]
async fn test_enqueue_assigns_id_and_timestamp() {
    let h = harness();

    let id = h
        .service
        .enqueue(EnqueueRequest::new(HttpMethod::Patch, "/profile").with_data(json!({"name": "Ada"})))
        .await;

    assert_eq!(id, "req-1");
    let queue = h.service.get_queue().await;
    assert_eq!(queue[0].id, "req-1");
    assert_eq!(queue[0].timestamp, T0);
    assert_eq!(queue[0].method, HttpMethod::Patch);
}

#[tokio::test]
async fn test_corrupt_store_starts_empty_and_recovers() {
    let h = harness();
    h.kv.set("offline_queue", "[{\"broken\":").await.unwrap();

    assert!(h.service.get_queue().await.is_empty());

    h.service.add_to_queue(booking("a", "42", T0)).await;
    assert_eq!(persisted(&h.kv).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_init_loads_exactly_once() {
    let mut kv = MockKeyValueStore::new();
    kv.expect_get().times(1).returning(|_| Ok(Some("[]".to_string())));
    kv.expect_set().returning(|_, _| Ok(()));

    let service = service_over(Arc::new(kv), Arc::new(ManualTimeProvider::new(T0)));
    service.initialize().await;
    service.add_to_queue(booking("a", "42", T0)).await;
    service.get_queue().await;
    service.stats().await;
}

#[tokio::test]
async fn test_clean_without_expired_skips_write() {
    let mut kv = MockKeyValueStore::new();
    kv.expect_get().returning(|_| {
        let raw = serde_json::to_string(&vec![booking("a", "42", T0)]).unwrap();
        Ok(Some(raw))
    });
    kv.expect_set().times(0);

    let service = service_over(Arc::new(kv), Arc::new(ManualTimeProvider::new(T0 + 1)));
    assert_eq!(service.clean_expired_requests(Some(1_000)).await, 0);
    assert_eq!(service.len().await, 1);
}

#[tokio::test]
async fn test_remove_unknown_id_still_writes() {
    let mut kv = MockKeyValueStore::new();
    kv.expect_get().returning(|_| {
        let raw = serde_json::to_string(&vec![booking("a", "42", T0)]).unwrap();
        Ok(Some(raw))
    });
    kv.expect_set()
        .times(1)
        .withf(|key, raw| key.to_string() == "offline_queue" && raw.contains("\"id\":\"a\""))
        .returning(|_, _| Ok(()));

    let service = service_over(Arc::new(kv), Arc::new(ManualTimeProvider::new(T0)));
    service.remove_from_queue("nope").await;
    assert_eq!(service.len().await, 1);
}

#[tokio::test]
async fn test_write_failure_keeps_in_memory_state() {
    let mut kv = MockKeyValueStore::new();
    kv.expect_get().returning(|_| Ok(None));
    kv.expect_set()
        .returning(|_, _| Err(AppError::Storage("quota exceeded".to_string())));

    let service = service_over(Arc::new(kv), Arc::new(ManualTimeProvider::new(T0)));
    service.add_to_queue(booking("a", "42", T0)).await;
    service.add_to_queue(booking("b", "43", T0 + 1)).await;
    service
        .add_to_queue(QueuedRequest::new("c", HttpMethod::Delete, "/favorites/1", T0 + 2))
        .await;
    service.remove_from_queue("c").await;

    let queue = service.get_queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, "b");
}

#[tokio::test]
async fn test_concurrent_adds_are_all_persisted() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let service = OfflineQueueService::<Value, Value>::new(
        kv.clone(),
        Arc::new(UuidProvider),
        Arc::new(ManualTimeProvider::new(T0)),
        QueueConfig::default(),
    )
    .unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .enqueue(EnqueueRequest::new(HttpMethod::Post, format!("/messages/{i}")))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(service.len().await, 20);
    assert_eq!(persisted(&kv).await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_stats_reports_bounds() {
    let h = harness();
    assert_eq!(
        h.service.stats().await,
        QueueStats {
            pending: 0,
            capacity: 100,
            oldest_timestamp: None,
            newest_timestamp: None,
        }
    );

    h.service.add_to_queue(booking("a", "42", T0 - 5)).await;
    h.service
        .add_to_queue(QueuedRequest::new("b", HttpMethod::Put, "/profile", T0))
        .await;

    let stats = h.service.stats().await;
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.oldest_timestamp, Some(T0 - 5));
    assert_eq!(stats.newest_timestamp, Some(T0));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let result = OfflineQueueService::<Value, Value>::new(
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(UuidProvider),
        Arc::new(ManualTimeProvider::new(T0)),
        QueueConfig::default().with_max_entries(0),
    );
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_sweeper_run_once_and_shutdown() {
    let h = harness();
    h.service.add_to_queue(booking("old", "1", T0 - 10_000)).await;
    h.service
        .add_to_queue(QueuedRequest::new("new", HttpMethod::Put, "/profile", T0))
        .await;

    let sweeper = ExpirySweeper::new(h.service.clone(), std::time::Duration::from_secs(3600), Some(5_000));
    assert_eq!(sweeper.run_once().await, 1);
    assert_eq!(sweeper.run_once().await, 0);

    h.service.add_to_queue(booking("older", "2", T0 - 20_000)).await;
    let (tx, token) = shutdown_channel();
    let handle = tokio::spawn(sweeper.run(token));
    // First tick fires immediately; give it a moment before stopping
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    tx.shutdown();

    assert_eq!(handle.await.unwrap(), 1);
    let ids: Vec<_> = h.service.get_queue().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["new".to_string()]);
}
