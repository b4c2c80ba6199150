mod common;

use arzeka_pay::application::engine::ReconciliationEngine;
use arzeka_pay::domain::attempt::PaymentAttempt;
use arzeka_pay::domain::ports::{PaymentStore, Versioned};
use arzeka_pay::domain::report::{ChannelOrigin, StatusReport};
use arzeka_pay::domain::status::PaymentStatus;
use arzeka_pay::error::{PaymentError, Result};
use arzeka_pay::infrastructure::in_memory::InMemoryPaymentStore;
use async_trait::async_trait;
use common::{completed_report, incomplete_report, pending_attempt, pending_report};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Store wrapper that reports a conflict for the first `failures` update
/// calls, then delegates. Lets tests force the engine down its retry
/// path deterministically.
struct ConflictingStore {
    inner: InMemoryPaymentStore,
    remaining_failures: AtomicU32,
    update_calls: AtomicU32,
}

impl ConflictingStore {
    fn new(failures: u32) -> Self {
        Self {
            inner: InMemoryPaymentStore::new(),
            remaining_failures: AtomicU32::new(failures),
            update_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl PaymentStore for ConflictingStore {
    async fn insert(&self, attempt: PaymentAttempt) -> Result<()> {
        self.inner.insert(attempt).await
    }

    async fn get(&self, reference: &str) -> Result<Option<Versioned<PaymentAttempt>>> {
        self.inner.get(reference).await
    }

    async fn update(&self, expected_version: u64, attempt: PaymentAttempt) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PaymentError::StoreConflict);
        }
        self.inner.update(expected_version, attempt).await
    }
}

#[tokio::test]
async fn test_engine_retries_through_conflicts() {
    let store = Arc::new(ConflictingStore::new(3));
    store.insert(pending_attempt("K")).await.unwrap();

    let engine = ReconciliationEngine::new(store.clone());
    let outcome = engine
        .reconcile("K", completed_report("TX1"), ChannelOrigin::Push)
        .await
        .unwrap();

    assert_eq!(outcome.status(), PaymentStatus::Completed);
    assert_eq!(store.update_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_engine_surfaces_conflict_when_retries_exhaust() {
    let store = Arc::new(ConflictingStore::new(u32::MAX));
    store.insert(pending_attempt("K")).await.unwrap();

    let engine = ReconciliationEngine::new(store.clone());
    let err = engine
        .reconcile("K", completed_report("TX1"), ChannelOrigin::Push)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Conflict { .. }));

    // The record survives untouched.
    let record = store.get("K").await.unwrap().unwrap().record;
    assert_eq!(record.status, PaymentStatus::Pending);
    assert!(record.history.is_empty());
}

#[tokio::test]
async fn test_push_asks_for_redelivery_on_persistent_conflict() {
    use arzeka_pay::application::channels::{PushAck, PushChannel};

    let store = Arc::new(ConflictingStore::new(u32::MAX));
    store.insert(pending_attempt("K")).await.unwrap();

    let channel = PushChannel::new(ReconciliationEngine::new(store));
    let ack = channel
        .notify(StatusReport::from(serde_json::json!({
            "third_party_mapped_order_id": "K",
            "status": "COMPLETED",
            "third_party_trans_id": "TX1",
        })))
        .await;
    // The update genuinely failed, so the gateway should redeliver.
    assert_eq!(ack, PushAck::Retry);
}

#[tokio::test]
async fn test_commutativity_when_one_report_is_terminal() {
    let pairs: Vec<(StatusReport, StatusReport)> = vec![
        (pending_report(), completed_report("TX1")),
        (pending_report(), incomplete_report()),
    ];

    for (a, b) in pairs {
        let mut final_statuses = Vec::new();
        for order in [[a.clone(), b.clone()], [b.clone(), a.clone()]] {
            let store = Arc::new(InMemoryPaymentStore::new());
            store.insert(pending_attempt("K")).await.unwrap();
            let engine = ReconciliationEngine::new(store.clone());
            for report in order {
                let _ = engine.reconcile("K", report, ChannelOrigin::Push).await;
            }
            final_statuses.push(store.get("K").await.unwrap().unwrap().record.status);
        }
        // The terminal report wins regardless of arrival order.
        assert_eq!(final_statuses[0], final_statuses[1]);
        assert!(final_statuses[0].is_terminal());
    }
}

#[tokio::test]
async fn test_concurrent_poll_and_push_on_one_reference() {
    // The defining hazard: both channels racing on the same key. Exactly
    // one terminal outcome must survive, with no lost or duplicated
    // history entries.
    for _ in 0..50 {
        let store = Arc::new(InMemoryPaymentStore::new());
        store.insert(pending_attempt("K")).await.unwrap();
        let engine = ReconciliationEngine::new(store.clone());

        let poll_engine = engine.clone();
        let poll = tokio::spawn(async move {
            poll_engine
                .reconcile("K", incomplete_report(), ChannelOrigin::Poll)
                .await
        });
        let push_engine = engine.clone();
        let push = tokio::spawn(async move {
            push_engine
                .reconcile("K", completed_report("TX1"), ChannelOrigin::Push)
                .await
        });

        let (poll_result, push_result) = tokio::join!(poll, push);
        poll_result.unwrap().unwrap();
        push_result.unwrap().unwrap();

        let record = store.get("K").await.unwrap().unwrap().record;
        assert!(record.status.is_terminal());
        // Whichever lost arrived after finalization and was ignored.
        assert_eq!(record.history.len(), 1);
        match record.status {
            PaymentStatus::Completed => {
                assert_eq!(record.transaction_id.as_deref(), Some("TX1"));
            }
            PaymentStatus::Failed => {
                assert!(record.transaction_id.is_none());
            }
            other => panic!("unexpected terminal status {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_distinct_references_do_not_contend() {
    let store = Arc::new(InMemoryPaymentStore::new());
    let engine = ReconciliationEngine::new(store.clone());

    let mut handles = Vec::new();
    for i in 0..20 {
        let reference = format!("K{i}");
        store.insert(pending_attempt(&reference)).await.unwrap();
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .reconcile(
                    &reference,
                    completed_report(&format!("TX{i}")),
                    ChannelOrigin::Push,
                )
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    for i in 0..20 {
        let record = store.get(&format!("K{i}")).await.unwrap().unwrap().record;
        assert_eq!(record.status, PaymentStatus::Completed);
        assert_eq!(record.transaction_id.as_deref(), Some(format!("TX{i}").as_str()));
    }
}
