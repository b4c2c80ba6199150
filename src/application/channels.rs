use crate::application::engine::{ReconcileOutcome, ReconciliationEngine};
use crate::domain::ports::GatewayClientRef;
use crate::domain::report::{ChannelOrigin, StatusReport};
use crate::domain::status::PaymentStatus;
use crate::error::{PaymentError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// What a customer poll learned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Status {
        status: PaymentStatus,
        transitioned: bool,
    },
    /// No attempt with this reference. Informational: the customer is
    /// told the reference is wrong, not shown an error page.
    Unknown { reference: String },
    /// Transient failure: nothing was recorded, a later poll or the push
    /// channel can still succeed. Informational for the customer, never a
    /// hard error.
    TryLater { reason: String },
}

/// Customer-initiated status check: asks the gateway for a fresh report,
/// then reconciles it.
#[derive(Clone)]
pub struct PollChannel {
    gateway: GatewayClientRef,
    engine: ReconciliationEngine,
    check_timeout: Duration,
}

impl PollChannel {
    pub fn new(gateway: GatewayClientRef, engine: ReconciliationEngine, check_timeout: Duration) -> Self {
        Self {
            gateway,
            engine,
            check_timeout,
        }
    }

    /// Errors only on store failures; unknown references and every
    /// gateway-side problem come back as informational outcomes.
    pub async fn poll(&self, reference: &str) -> Result<PollOutcome> {
        // The gateway round-trip happens before the record is loaded, so
        // the read-CAS window never spans remote I/O.
        let report = match timeout(self.check_timeout, self.gateway.check(reference)).await {
            Ok(Ok(report)) => report,
            Ok(Err(PaymentError::GatewayApi(err))) => {
                warn!(reference, %err, "gateway check rejected");
                return Ok(PollOutcome::TryLater {
                    reason: err.to_string(),
                });
            }
            Ok(Err(other)) => return Err(other),
            Err(_) => {
                warn!(reference, timeout_ms = self.check_timeout.as_millis() as u64, "gateway check timed out");
                return Ok(PollOutcome::TryLater {
                    reason: "gateway did not answer in time".to_string(),
                });
            }
        };

        match self
            .engine
            .reconcile(reference, report, ChannelOrigin::Poll)
            .await
        {
            Ok(outcome) => Ok(PollOutcome::Status {
                status: outcome.status(),
                transitioned: matches!(
                    outcome,
                    ReconcileOutcome::Applied {
                        transitioned: true,
                        ..
                    }
                ),
            }),
            Err(PaymentError::NotFound { reference }) => {
                warn!(reference, "poll for unknown reference");
                Ok(PollOutcome::Unknown { reference })
            }
            Err(PaymentError::MalformedReport { reason }) => {
                warn!(reference, reason, "gateway sent an unusable report");
                Ok(PollOutcome::TryLater { reason })
            }
            Err(PaymentError::Conflict { .. }) => Ok(PollOutcome::TryLater {
                reason: "the record is busy, try again shortly".to_string(),
            }),
            Err(other) => Err(other),
        }
    }
}

/// How to answer the gateway's push. Gateways redeliver on anything that
/// does not look like success, so the ack must separate "this delivery
/// can never succeed, stop" from "try me again".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAck {
    /// Delivery handled, or permanently unprocessable (unknown reference,
    /// missing join key, malformed terminal report). Redelivery would
    /// change nothing.
    Accepted,
    /// Transient local failure; redelivery is wanted.
    Retry,
}

/// Gateway-initiated callbacks: reconciles the pushed payload directly,
/// no outbound call.
#[derive(Clone)]
pub struct PushChannel {
    engine: ReconciliationEngine,
}

impl PushChannel {
    pub fn new(engine: ReconciliationEngine) -> Self {
        Self { engine }
    }

    pub async fn notify(&self, payload: StatusReport) -> PushAck {
        let Some(reference) = payload.mapped_order_id().map(str::to_string) else {
            warn!("push payload carries no third_party_mapped_order_id, dropping");
            return PushAck::Accepted;
        };

        match self
            .engine
            .reconcile(&reference, payload, ChannelOrigin::Push)
            .await
        {
            Ok(outcome) => {
                info!(reference, status = %outcome.status(), noop = outcome.is_noop(), "push handled");
                PushAck::Accepted
            }
            Err(err @ PaymentError::NotFound { .. }) => {
                warn!(reference, %err, "push for unknown reference dropped");
                PushAck::Accepted
            }
            Err(err @ PaymentError::MalformedReport { .. }) => {
                warn!(reference, %err, "malformed push dropped");
                PushAck::Accepted
            }
            Err(err) => {
                warn!(reference, %err, "transient failure handling push, asking for redelivery");
                PushAck::Retry
            }
        }
    }
}
