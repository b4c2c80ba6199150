use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which channel delivered a status report. Recorded for audit; the merge
/// logic never branches on it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrigin {
    Poll,
    Push,
}

impl std::fmt::Display for ChannelOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poll => f.write_str("poll"),
            Self::Push => f.write_str("push"),
        }
    }
}

/// A raw status payload as the gateway sent it. The shape is
/// gateway-defined; we only ever read the handful of fields below and
/// otherwise store the payload verbatim.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(transparent)]
pub struct StatusReport(Map<String, Value>);

impl StatusReport {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The gateway's own status word, e.g. `COMPLETED`.
    pub fn gateway_status(&self) -> Option<&str> {
        self.str_field("status")
    }

    /// Gateway-side transaction id, present on completed reports.
    pub fn transaction_id(&self) -> Option<&str> {
        self.str_field("third_party_trans_id")
    }

    /// Correlation reference echoed back in push payloads.
    pub fn mapped_order_id(&self) -> Option<&str> {
        self.str_field("third_party_mapped_order_id")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Value> for StatusReport {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                // Non-object payloads are preserved under a single key so
                // nothing the gateway sent is dropped from the audit trail.
                let mut map = Map::new();
                map.insert("raw".to_string(), other);
                Self(map)
            }
        }
    }
}

/// One entry of the append-only report history. `seq` is the receipt
/// order within the attempt, assigned by the engine.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ReportEntry {
    pub origin: ChannelOrigin,
    pub seq: u32,
    pub received_at: DateTime<Utc>,
    pub report: StatusReport,
}

/// Non-terminal reports accumulated before the final one.
///
/// Keeps the compact single-report representation in the common case and
/// upgrades to an ordered sequence when a second report arrives, without
/// inspecting stored shapes at runtime.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "lowercase", tag = "kind", content = "reports")]
pub enum IntermediaryResponses {
    #[default]
    None,
    One(StatusReport),
    Many(Vec<StatusReport>),
}

impl IntermediaryResponses {
    pub fn push(&mut self, report: StatusReport) {
        *self = match std::mem::take(self) {
            Self::None => Self::One(report),
            Self::One(first) => Self::Many(vec![first, report]),
            Self::Many(mut reports) => {
                reports.push(report);
                Self::Many(reports)
            }
        };
    }

    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Many(reports) => reports.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(status: &str) -> StatusReport {
        StatusReport::from(json!({ "status": status }))
    }

    #[test]
    fn test_report_field_accessors() {
        let r = StatusReport::from(json!({
            "status": "COMPLETED",
            "third_party_trans_id": "TX123",
            "third_party_mapped_order_id": "eT251022.143025.123456",
        }));
        assert_eq!(r.gateway_status(), Some("COMPLETED"));
        assert_eq!(r.transaction_id(), Some("TX123"));
        assert_eq!(r.mapped_order_id(), Some("eT251022.143025.123456"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let r = StatusReport::default();
        assert_eq!(r.gateway_status(), None);
        assert_eq!(r.transaction_id(), None);
    }

    #[test]
    fn test_non_object_payload_is_kept() {
        let r = StatusReport::from(json!("PENDING"));
        assert_eq!(r.fields().get("raw"), Some(&json!("PENDING")));
    }

    #[test]
    fn test_intermediary_growth() {
        let mut acc = IntermediaryResponses::default();
        assert!(acc.is_empty());

        acc.push(report("PENDING"));
        assert!(matches!(acc, IntermediaryResponses::One(_)));
        assert_eq!(acc.len(), 1);

        acc.push(report("PENDING"));
        assert_eq!(acc.len(), 2);

        acc.push(report("INCOMPLETE"));
        match &acc {
            IntermediaryResponses::Many(reports) => {
                assert_eq!(reports.len(), 3);
                assert_eq!(reports[0].gateway_status(), Some("PENDING"));
                assert_eq!(reports[2].gateway_status(), Some("INCOMPLETE"));
            }
            other => panic!("expected Many, got {other:?}"),
        }
    }
}
