use crate::domain::ports::PaymentStoreRef;
use crate::domain::report::{ChannelOrigin, StatusReport};
use crate::domain::status::PaymentStatus;
use crate::error::{PaymentError, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Bound on compare-and-swap retries for one reconcile call. Two channels
/// racing on one reference is the expected case, so a single attempt
/// would lose real updates; anything past a handful means the store is
/// misbehaving and the caller should hear about it.
const MAX_UPDATE_ATTEMPTS: u32 = 5;

/// What a reconcile call did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The record was already terminal; the report was ignored without
    /// touching it. Carries the existing terminal status.
    AlreadyFinal { status: PaymentStatus },
    /// The report was applied. `transitioned` is false when the status
    /// value did not change (a pending re-report still appends to the
    /// record but is not news to anyone).
    Applied {
        status: PaymentStatus,
        transitioned: bool,
    },
}

impl ReconcileOutcome {
    pub fn status(&self) -> PaymentStatus {
        match self {
            Self::AlreadyFinal { status } | Self::Applied { status, .. } => *status,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::AlreadyFinal { .. })
    }
}

/// Merges gateway status reports into payment attempts.
///
/// Reports reach this engine from two independent channels (customer poll
/// and gateway push) with no ordering or dedup guarantees. Correctness
/// rests on two rules: terminal state is absorbing (whoever finalizes
/// first wins, every later report is a no-op), and each write is a
/// versioned compare-and-swap retried on conflict, so racing writers
/// serialize through the store rather than through in-process locks.
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: PaymentStoreRef,
}

impl ReconciliationEngine {
    pub fn new(store: PaymentStoreRef) -> Self {
        Self { store }
    }

    /// Ingests one raw status report for `reference`.
    ///
    /// `origin` is recorded in the history for audit; it never influences
    /// the merge. Errors: `NotFound` for an unknown reference (no record
    /// is created), `MalformedReport` for a completed report without a
    /// transaction id (record untouched), `Conflict` once retries are
    /// exhausted.
    pub async fn reconcile(
        &self,
        reference: &str,
        report: StatusReport,
        origin: ChannelOrigin,
    ) -> Result<ReconcileOutcome> {
        for attempt_no in 0..MAX_UPDATE_ATTEMPTS {
            let versioned = self
                .store
                .get(reference)
                .await?
                .ok_or_else(|| PaymentError::NotFound {
                    reference: reference.to_string(),
                })?;
            let mut attempt = versioned.record;

            if attempt.is_finalized() {
                debug!(
                    reference,
                    status = %attempt.status,
                    %origin,
                    "report for finalized attempt ignored"
                );
                return Ok(ReconcileOutcome::AlreadyFinal {
                    status: attempt.status,
                });
            }

            let previous = attempt.status;
            let normalized = PaymentStatus::from_gateway(report.gateway_status());
            let now = Utc::now();

            if normalized == PaymentStatus::Completed {
                let transaction_id = report.transaction_id().ok_or_else(|| {
                    PaymentError::MalformedReport {
                        reason: format!(
                            "completed report for {reference} is missing third_party_trans_id"
                        ),
                    }
                })?;
                attempt.complete(report.clone(), transaction_id.to_string(), origin, now);
            } else {
                attempt.record_intermediary(report.clone(), normalized, origin, now);
            }
            let status = attempt.status;

            match self.store.update(versioned.version, attempt).await {
                Ok(()) => {
                    let transitioned = status != previous;
                    if transitioned {
                        info!(reference, from = %previous, to = %status, %origin, "status transition");
                    } else {
                        debug!(reference, status = %status, %origin, "report recorded, status unchanged");
                    }
                    return Ok(ReconcileOutcome::Applied {
                        status,
                        transitioned,
                    });
                }
                Err(PaymentError::StoreConflict) => {
                    debug!(
                        reference,
                        attempt = attempt_no + 1,
                        "concurrent update, reloading"
                    );
                    continue;
                }
                Err(other) => return Err(other),
            }
        }

        warn!(reference, attempts = MAX_UPDATE_ATTEMPTS, "reconcile retries exhausted");
        Err(PaymentError::Conflict {
            reference: reference.to_string(),
        })
    }
}
