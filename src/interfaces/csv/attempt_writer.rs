use crate::domain::attempt::PaymentAttempt;
use crate::error::Result;
use std::io::Write;

/// Writes final attempt states as CSV:
/// `reference,status,transaction_id,reports`.
pub struct AttemptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AttemptWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_attempts(&mut self, attempts: Vec<PaymentAttempt>) -> Result<()> {
        self.writer
            .write_record(["reference", "status", "transaction_id", "reports"])?;
        for attempt in attempts {
            self.writer.write_record([
                attempt.reference.as_str(),
                attempt.status.as_str(),
                attempt.transaction_id.as_deref().unwrap_or(""),
                &attempt.history.len().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
