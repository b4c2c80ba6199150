use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Poll,
    Push,
}

/// One row of a recorded traffic file.
///
/// `create` rows carry the customer columns; `poll` and `push` rows carry
/// the gateway's status word and, when terminal, its transaction id.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ReplayEvent {
    pub event: EventKind,
    pub reference: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Reads replay events from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record
/// lengths, yielding an iterator of `Result<ReplayEvent>` so large files
/// stream without being loaded whole.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn events(self) -> impl Iterator<Item = Result<ReplayEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
