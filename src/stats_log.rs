//! Persisted per-object, per-frame statistics.
//!
//! Records are handed to a [`RecordSink`] as they are produced rather than
//! buffered until the end of the stream.

mod csv_sink;
mod record;
mod retry;

pub use csv_sink::CsvRecordSink;
pub use record::{CSV_HEADER, LogRecord, format_region_list};
pub use retry::RetryPolicy;

use crate::error::Result;

/// Destination for log records.
pub trait RecordSink {
    /// Append one record.
    fn append(&mut self, record: &LogRecord) -> Result<()>;

    /// Make everything appended so far durable and release the destination.
    fn finish(&mut self) -> Result<()>;
}

/// In-memory log, mostly useful for tests and summaries.
impl RecordSink for Vec<LogRecord> {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        (**self).append(record)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
