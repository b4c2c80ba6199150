#![allow(dead_code)]

use arzeka_pay::domain::attempt::PaymentAttempt;
use arzeka_pay::domain::customer::{Amount, Customer};
use arzeka_pay::domain::report::StatusReport;
use chrono::Utc;
use serde_json::json;

pub fn pending_attempt(reference: &str) -> PaymentAttempt {
    PaymentAttempt::new(
        reference.to_string(),
        Customer::new("Ali", "Traore", "+226 70 12 34 56").unwrap(),
        Amount::new(5000).unwrap(),
        Utc::now(),
    )
}

pub fn pending_report() -> StatusReport {
    StatusReport::from(json!({ "status": "PENDING" }))
}

pub fn incomplete_report() -> StatusReport {
    StatusReport::from(json!({ "status": "INCOMPLETE" }))
}

pub fn completed_report(transaction_id: &str) -> StatusReport {
    StatusReport::from(json!({
        "status": "COMPLETED",
        "third_party_trans_id": transaction_id,
    }))
}
