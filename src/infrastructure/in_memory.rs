use crate::domain::attempt::PaymentAttempt;
use crate::domain::ports::{PaymentStore, Versioned};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory payment store with optimistic versioning.
///
/// Each record carries a version bumped on every successful write;
/// `update` is a compare-and-swap against it. This gives tests and the
/// replay binary the same conflict semantics a relational store with an
/// ETag column would, without any persistence.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    attempts: Arc<RwLock<HashMap<String, Versioned<PaymentAttempt>>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Final state of every attempt, sorted by reference. Used by the
    /// replay writer.
    pub async fn all_attempts(&self) -> Vec<PaymentAttempt> {
        let attempts = self.attempts.read().await;
        let mut records: Vec<PaymentAttempt> =
            attempts.values().map(|v| v.record.clone()).collect();
        records.sort_by(|a, b| a.reference.cmp(&b.reference));
        records
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, attempt: PaymentAttempt) -> Result<()> {
        let mut attempts = self.attempts.write().await;
        if attempts.contains_key(&attempt.reference) {
            return Err(PaymentError::DuplicateReference {
                reference: attempt.reference,
            });
        }
        attempts.insert(
            attempt.reference.clone(),
            Versioned {
                record: attempt,
                version: 1,
            },
        );
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<Versioned<PaymentAttempt>>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(reference).cloned())
    }

    async fn update(&self, expected_version: u64, attempt: PaymentAttempt) -> Result<()> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(&attempt.reference) {
            Some(existing) if existing.version == expected_version => {
                *existing = Versioned {
                    record: attempt,
                    version: expected_version + 1,
                };
                Ok(())
            }
            // A vanished row during update is also a concurrent writer.
            _ => Err(PaymentError::StoreConflict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::{Amount, Customer};
    use chrono::Utc;

    fn attempt(reference: &str) -> PaymentAttempt {
        PaymentAttempt::new(
            reference.to_string(),
            Customer::new("Ali", "Traore", "+22670123456").unwrap(),
            Amount::new(5000).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryPaymentStore::new();
        store.insert(attempt("eT1")).await.unwrap();

        let versioned = store.get("eT1").await.unwrap().unwrap();
        assert_eq!(versioned.version, 1);
        assert_eq!(versioned.record.reference, "eT1");

        assert!(store.get("eT2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_reference() {
        let store = InMemoryPaymentStore::new();
        store.insert(attempt("eT1")).await.unwrap();
        let err = store.insert(attempt("eT1")).await.unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateReference { .. }));
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryPaymentStore::new();
        store.insert(attempt("eT1")).await.unwrap();

        let versioned = store.get("eT1").await.unwrap().unwrap();
        store.update(versioned.version, versioned.record).await.unwrap();

        let after = store.get("eT1").await.unwrap().unwrap();
        assert_eq!(after.version, 2);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let store = InMemoryPaymentStore::new();
        store.insert(attempt("eT1")).await.unwrap();

        let first = store.get("eT1").await.unwrap().unwrap();
        let second = store.get("eT1").await.unwrap().unwrap();

        store.update(first.version, first.record).await.unwrap();
        let err = store
            .update(second.version, second.record)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::StoreConflict));
    }

    #[tokio::test]
    async fn test_update_unknown_reference_conflicts() {
        let store = InMemoryPaymentStore::new();
        let err = store.update(1, attempt("eT1")).await.unwrap_err();
        assert!(matches!(err, PaymentError::StoreConflict));
    }
}
