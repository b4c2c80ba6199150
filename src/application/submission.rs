use crate::domain::attempt::PaymentAttempt;
use crate::domain::customer::{Amount, Customer};
use crate::domain::ports::{
    GatewayClientRef, InitiateRequest, MerchantCredentials, PaymentStoreRef,
};
use crate::domain::reference::ReferenceSource;
use crate::error::{PaymentError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_REFERENCE_ATTEMPTS: u32 = 3;
const MAX_SNAPSHOT_ATTEMPTS: u32 = 3;

/// Unvalidated customer input for a new payment attempt.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub amount: u64,
}

/// Creates payment attempts and opens them with the gateway.
///
/// The record is persisted before the gateway hears about it, so a push
/// callback can never reference an attempt the store does not have. If
/// the gateway rejects initiation, the attempt stays `Pending` in the
/// store and the rejection propagates to the caller.
pub struct SubmissionService {
    store: PaymentStoreRef,
    gateway: GatewayClientRef,
    references: Arc<dyn ReferenceSource>,
    credentials: MerchantCredentials,
    status_update_url: String,
    return_url: String,
}

impl SubmissionService {
    pub fn new(
        store: PaymentStoreRef,
        gateway: GatewayClientRef,
        references: Arc<dyn ReferenceSource>,
        credentials: MerchantCredentials,
        status_update_url: String,
        return_url: String,
    ) -> Self {
        Self {
            store,
            gateway,
            references,
            credentials,
            status_update_url,
            return_url,
        }
    }

    pub async fn submit(&self, request: NewPayment) -> Result<PaymentAttempt> {
        let customer = Customer::new(&request.firstname, &request.lastname, &request.phone)?;
        let amount = Amount::new(request.amount)?;
        let attempt = self.insert_with_fresh_reference(customer, amount).await?;
        self.initiate(attempt).await
    }

    /// Like `submit`, but with a caller-chosen reference. Used by replays
    /// of recorded traffic, where references must match history.
    pub async fn submit_with_reference(
        &self,
        reference: String,
        request: NewPayment,
    ) -> Result<PaymentAttempt> {
        let customer = Customer::new(&request.firstname, &request.lastname, &request.phone)?;
        let amount = Amount::new(request.amount)?;
        let attempt = PaymentAttempt::new(reference, customer, amount, Utc::now());
        self.store.insert(attempt.clone()).await?;
        self.initiate(attempt).await
    }

    /// The generator is clock-based, so uniqueness is ultimately the
    /// store's unique constraint: a `DuplicateReference` rejection means
    /// regenerate and try again, bounded.
    async fn insert_with_fresh_reference(
        &self,
        customer: Customer,
        amount: Amount,
    ) -> Result<PaymentAttempt> {
        let mut last_reference = String::new();
        for _ in 0..MAX_REFERENCE_ATTEMPTS {
            let reference = self.references.generate();
            let attempt =
                PaymentAttempt::new(reference.clone(), customer.clone(), amount, Utc::now());
            match self.store.insert(attempt.clone()).await {
                Ok(()) => {
                    info!(reference, amount = amount.value(), "payment attempt created");
                    return Ok(attempt);
                }
                Err(PaymentError::DuplicateReference { reference }) => {
                    warn!(reference, "reference collision, regenerating");
                    last_reference = reference;
                }
                Err(other) => return Err(other),
            }
        }
        Err(PaymentError::DuplicateReference {
            reference: last_reference,
        })
    }

    async fn initiate(&self, attempt: PaymentAttempt) -> Result<PaymentAttempt> {
        let reference = attempt.reference.clone();
        let outcome = self
            .gateway
            .initiate(InitiateRequest {
                reference: reference.clone(),
                amount: attempt.amount,
                customer: attempt.customer.clone(),
                credentials: self.credentials.clone(),
                status_update_url: self.status_update_url.clone(),
                return_url: self.return_url.clone(),
            })
            .await?;

        // The gateway knows the reference now, so its push can already be
        // racing us; attach the snapshots through the same CAS discipline
        // as any other update.
        for _ in 0..MAX_SNAPSHOT_ATTEMPTS {
            let versioned = self
                .store
                .get(&reference)
                .await?
                .ok_or_else(|| PaymentError::NotFound {
                    reference: reference.clone(),
                })?;
            let mut record = versioned.record;
            record.attach_initiation(
                outcome.request_snapshot.clone(),
                outcome.response.clone(),
                Utc::now(),
            )?;
            match self.store.update(versioned.version, record.clone()).await {
                Ok(()) => {
                    info!(reference, "gateway initiation recorded");
                    return Ok(record);
                }
                Err(PaymentError::StoreConflict) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(PaymentError::Conflict { reference })
    }
}
