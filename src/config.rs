use crate::domain::ports::MerchantCredentials;
use std::time::Duration;

const DEFAULT_CHECK_TIMEOUT_MS: u64 = 5_000;

#[derive(Clone)]
pub struct AppConfig {
    pub merchant_id: String,
    pub hash_secret: String,
    /// Where the gateway pushes status callbacks.
    pub status_update_url: String,
    /// Where the customer returns after the gateway flow.
    pub return_url: String,
    /// Upper bound on one outbound `check` call.
    pub check_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            merchant_id: std::env::var("ARZEKA_MERCHANT_ID")
                .unwrap_or_else(|_| "dev-merchant".to_string()),
            hash_secret: std::env::var("ARZEKA_HASH_SECRET")
                .unwrap_or_else(|_| "dev-hash-secret".to_string()),
            status_update_url: std::env::var("ARZEKA_STATUS_UPDATE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/update-payment-status/".to_string()),
            return_url: std::env::var("ARZEKA_RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:8000/check-payment-status/".to_string()),
            check_timeout: Duration::from_millis(
                std::env::var("ARZEKA_CHECK_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_CHECK_TIMEOUT_MS),
            ),
        }
    }

    pub fn credentials(&self) -> MerchantCredentials {
        MerchantCredentials {
            merchant_id: self.merchant_id.clone(),
            hash_secret: self.hash_secret.clone(),
        }
    }
}
