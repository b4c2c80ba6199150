use crate::domain::attempt::PaymentAttempt;
use crate::domain::customer::{Amount, Customer};
use crate::domain::report::StatusReport;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A record paired with the store version it was read at. `update` must
/// present the same version back; a mismatch means a concurrent writer
/// got there first.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub record: T,
    pub version: u64,
}

/// Durable keyed storage for payment attempts.
///
/// The store, not the process, serializes writers: `update` is a
/// compare-and-swap on the version read by `get`, so two replicas racing
/// on one reference cannot both win. Different references never contend.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Fails with `DuplicateReference` if the reference already exists.
    async fn insert(&self, attempt: PaymentAttempt) -> Result<()>;

    async fn get(&self, reference: &str) -> Result<Option<Versioned<PaymentAttempt>>>;

    /// Persists the whole record atomically (status and history together).
    /// Fails with `StoreConflict` when `expected_version` is stale.
    async fn update(&self, expected_version: u64, attempt: PaymentAttempt) -> Result<()>;
}

pub type PaymentStoreRef = Arc<dyn PaymentStore>;

/// Merchant-side identity shared with the gateway. Injected where it is
/// needed instead of living in process-global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantCredentials {
    pub merchant_id: String,
    pub hash_secret: String,
}

/// A gateway session token with its expiry. Adapters hold one of these
/// and re-authenticate when `is_expired` says so, rather than trusting a
/// boot-time login for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Everything the gateway needs to open a payment session.
#[derive(Debug, Clone)]
pub struct InitiateRequest {
    pub reference: String,
    pub amount: Amount,
    pub customer: Customer,
    pub credentials: MerchantCredentials,
    /// Where the gateway pushes asynchronous status callbacks.
    pub status_update_url: String,
    /// Where the customer lands after the gateway flow.
    pub return_url: String,
}

/// What `initiate` hands back: the gateway's synchronous response plus
/// the exact payload we sent, both kept as audit snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct InitiateOutcome {
    pub response: StatusReport,
    pub request_snapshot: StatusReport,
}

/// Outbound adapter for the payment gateway. Both calls fail with
/// `GatewayApi` carrying the gateway's field -> message rejection map.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn initiate(&self, request: InitiateRequest) -> Result<InitiateOutcome>;

    /// Fetches the current raw status report for a reference.
    async fn check(&self, reference: &str) -> Result<StatusReport>;
}

pub type GatewayClientRef = Arc<dyn GatewayClient>;
