use std::collections::BTreeMap;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Rejection returned by the payment gateway on `initiate` or `check`,
/// as a field -> message map taken verbatim from its response body.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("gateway rejected the request: {}", details.values().cloned().collect::<Vec<_>>().join("; "))]
pub struct GatewayApiError {
    pub details: BTreeMap<String, String>,
}

impl GatewayApiError {
    pub fn new(details: BTreeMap<String, String>) -> Self {
        Self { details }
    }

    pub fn message(field: &str, message: &str) -> Self {
        Self {
            details: BTreeMap::from([(field.to_string(), message.to_string())]),
        }
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    /// The correlation reference does not exist in the store. Never
    /// creates a record and is never retried.
    #[error("no payment attempt with reference {reference}")]
    NotFound { reference: String },

    /// A terminal report violated the gateway contract (e.g. COMPLETED
    /// without a transaction id). The record is left untouched.
    #[error("malformed status report: {reason}")]
    MalformedReport { reason: String },

    /// A single compare-and-swap write lost to a concurrent writer.
    /// Engine-internal signal; retried before ever reaching a caller.
    #[error("concurrent update detected")]
    StoreConflict,

    /// The engine exhausted its update attempts on one reference.
    #[error("gave up reconciling {reference} after repeated write conflicts")]
    Conflict { reference: String },

    /// The store's unique constraint rejected a freshly generated
    /// reference. The submission flow retries with a new one.
    #[error("reference {reference} already exists")]
    DuplicateReference { reference: String },

    /// Initiation snapshots are write-once.
    #[error("attempt {reference} was already initiated")]
    AlreadyInitiated { reference: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    GatewayApi(#[from] GatewayApiError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
