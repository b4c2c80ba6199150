use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment attempt.
///
/// `Pending` is the only initial value. `Completed`, `Failed` and
/// `Cancelled` are terminal: once one of them is persisted, no further
/// transition is permitted and late reports are ignored.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Maps the gateway's status vocabulary to ours. Total over all
    /// inputs: unrecognized or missing values normalize to `Pending`
    /// (keep polling) instead of failing. An unexpected gateway word can
    /// therefore leave an attempt non-terminal longer than it should, but
    /// it can never wedge the attempt into a permanent error state. Do
    /// not tighten this without revisiting callers that rely on it.
    pub fn from_gateway(raw: Option<&str>) -> Self {
        match raw {
            Some("COMPLETED") => Self::Completed,
            Some("PENDING") => Self::Pending,
            Some("INCOMPLETE") => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
