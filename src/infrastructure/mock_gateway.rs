use crate::domain::ports::{AuthToken, GatewayClient, InitiateOutcome, InitiateRequest};
use crate::domain::report::StatusReport;
use crate::error::{GatewayApiError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

const SESSION_TTL_MINUTES: i64 = 15;

enum CheckScript {
    /// Hand out the queued reports in order, then fall back to PENDING.
    Respond(VecDeque<StatusReport>),
    /// Every check is rejected by the gateway.
    Reject,
    /// Checks hang until the caller's timeout fires.
    Stall,
}

/// Scriptable stand-in for the gateway adapter.
///
/// The real adapter is an HTTP client owned by the gateway integration
/// and lives outside this crate; tests and the replay binary script this
/// one per reference instead.
#[derive(Default)]
pub struct MockGateway {
    checks: Mutex<HashMap<String, CheckScript>>,
    reject_initiate: Mutex<bool>,
    initiated: Mutex<Vec<InitiateRequest>>,
    session: Mutex<Option<AuthToken>>,
    logins: Mutex<u32>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live session token, re-authenticating if the current one
    /// is missing or expired. Credentials are renewable state, not a
    /// boot-time fact.
    async fn session(&self) -> AuthToken {
        let mut session = self.session.lock().await;
        let now = Utc::now();
        if let Some(token) = session.as_ref()
            && !token.is_expired(now)
        {
            return token.clone();
        }
        let mut logins = self.logins.lock().await;
        *logins += 1;
        let token = AuthToken {
            token: format!("session-{}", *logins),
            expires_at: now + chrono::Duration::minutes(SESSION_TTL_MINUTES),
        };
        *session = Some(token.clone());
        token
    }

    /// Forces the current session to look expired (for renewal tests).
    pub async fn expire_session(&self) {
        if let Some(token) = self.session.lock().await.as_mut() {
            token.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    /// How many times the gateway authenticated so far.
    pub async fn login_count(&self) -> u32 {
        *self.logins.lock().await
    }

    /// Queues the next report `check` will return for `reference`.
    pub async fn enqueue_check(&self, reference: &str, report: serde_json::Value) {
        let mut checks = self.checks.lock().await;
        match checks
            .entry(reference.to_string())
            .or_insert_with(|| CheckScript::Respond(VecDeque::new()))
        {
            CheckScript::Respond(queue) => queue.push_back(StatusReport::from(report)),
            other => *other = CheckScript::Respond(VecDeque::from([StatusReport::from(report)])),
        }
    }

    /// All further checks for `reference` come back as gateway rejections.
    pub async fn fail_checks(&self, reference: &str) {
        self.checks
            .lock()
            .await
            .insert(reference.to_string(), CheckScript::Reject);
    }

    /// All further checks for `reference` hang (for timeout tests).
    pub async fn stall_checks(&self, reference: &str) {
        self.checks
            .lock()
            .await
            .insert(reference.to_string(), CheckScript::Stall);
    }

    /// All further initiations are rejected.
    pub async fn reject_initiations(&self) {
        *self.reject_initiate.lock().await = true;
    }

    /// Initiation requests seen so far, in order.
    pub async fn initiated(&self) -> Vec<InitiateRequest> {
        self.initiated.lock().await.clone()
    }
}

#[async_trait]
impl GatewayClient for MockGateway {
    async fn initiate(&self, request: InitiateRequest) -> Result<InitiateOutcome> {
        let session = self.session().await;
        if *self.reject_initiate.lock().await {
            return Err(GatewayApiError::message("merchant_id", "unknown merchant").into());
        }
        self.initiated.lock().await.push(request.clone());

        let request_snapshot = StatusReport::from(json!({
            "amount": request.amount.value(),
            "merchant_id": request.credentials.merchant_id,
            "hash_secret": request.credentials.hash_secret,
            "mapped_order_id": request.reference,
            "additional_info": {
                "firstname": request.customer.firstname,
                "lastname": request.customer.lastname,
                "mobile": request.customer.phone,
            },
            "link_for_update_status": request.status_update_url,
            "link_back_to_calling_website": request.return_url,
        }));
        let response = StatusReport::from(json!({
            "status": "PENDING",
            "session": session.token,
            "url": format!("https://pay.example/session/{}", request.reference),
        }));
        Ok(InitiateOutcome {
            response,
            request_snapshot,
        })
    }

    async fn check(&self, reference: &str) -> Result<StatusReport> {
        self.session().await;
        let mut checks = self.checks.lock().await;
        match checks.get_mut(reference) {
            Some(CheckScript::Respond(queue)) => Ok(queue
                .pop_front()
                .unwrap_or_else(|| StatusReport::from(json!({ "status": "PENDING" })))),
            Some(CheckScript::Reject) => {
                Err(GatewayApiError::message("paymentRequestID", "transaction introuvable").into())
            }
            Some(CheckScript::Stall) => {
                drop(checks);
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(StatusReport::from(json!({ "status": "PENDING" })))
            }
            None => Ok(StatusReport::from(json!({ "status": "PENDING" }))),
        }
    }
}
