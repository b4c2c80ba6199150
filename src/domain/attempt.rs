use crate::domain::customer::{Amount, Customer};
use crate::domain::report::{ChannelOrigin, IntermediaryResponses, ReportEntry, StatusReport};
use crate::domain::status::PaymentStatus;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One payment attempt: the unit the reconciliation engine works on.
///
/// Created by the submission flow, mutated exclusively through the
/// methods below, never deleted. Invariants:
/// - `reference` is assigned once and never changes;
/// - `status` never leaves a terminal value;
/// - `transaction_id` is set iff `status == Completed`;
/// - `history` is append-only, in receipt order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentAttempt {
    pub reference: String,
    pub customer: Customer,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    /// Payload we sent to the gateway at initiation, write-once.
    pub request_snapshot: Option<StatusReport>,
    /// Synchronous gateway response at initiation, write-once.
    pub initial_response: Option<StatusReport>,
    /// Non-terminal reports received before the final one.
    pub intermediary: IntermediaryResponses,
    /// The terminal report that drove the final status.
    pub final_response: Option<StatusReport>,
    /// Every raw report ever received, with channel origin, for audit.
    pub history: Vec<ReportEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentAttempt {
    pub fn new(
        reference: String,
        customer: Customer,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            reference,
            customer,
            amount,
            status: PaymentStatus::Pending,
            transaction_id: None,
            request_snapshot: None,
            initial_response: None,
            intermediary: IntermediaryResponses::default(),
            final_response: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status.is_terminal()
    }

    /// Records the initiation snapshots. Write-once: a second call is a
    /// bug in the caller, not a state to merge.
    pub fn attach_initiation(
        &mut self,
        request_snapshot: StatusReport,
        response: StatusReport,
        now: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        if self.request_snapshot.is_some() || self.initial_response.is_some() {
            return Err(PaymentError::AlreadyInitiated {
                reference: self.reference.clone(),
            });
        }
        self.request_snapshot = Some(request_snapshot);
        self.initial_response = Some(response);
        self.updated_at = now;
        Ok(())
    }

    /// Applies a completed report: final response, transaction id and the
    /// history entry land together.
    pub fn complete(
        &mut self,
        report: StatusReport,
        transaction_id: String,
        origin: ChannelOrigin,
        now: DateTime<Utc>,
    ) {
        debug_assert!(!self.is_finalized());
        self.append_history(report.clone(), origin, now);
        self.final_response = Some(report);
        self.transaction_id = Some(transaction_id);
        self.status = PaymentStatus::Completed;
        self.updated_at = now;
    }

    /// Applies a non-terminal (or failed) report: the raw payload joins
    /// the intermediary collection and the history, and the status takes
    /// the normalized value. `Failed` is terminal from here on.
    pub fn record_intermediary(
        &mut self,
        report: StatusReport,
        normalized: PaymentStatus,
        origin: ChannelOrigin,
        now: DateTime<Utc>,
    ) {
        debug_assert!(!self.is_finalized());
        debug_assert!(normalized != PaymentStatus::Completed);
        self.append_history(report.clone(), origin, now);
        self.intermediary.push(report);
        self.status = normalized;
        self.updated_at = now;
    }

    fn append_history(&mut self, report: StatusReport, origin: ChannelOrigin, now: DateTime<Utc>) {
        let seq = self.history.len() as u32;
        self.history.push(ReportEntry {
            origin,
            seq,
            received_at: now,
            report,
        });
    }
}
