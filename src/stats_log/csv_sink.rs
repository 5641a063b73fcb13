use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::record::{CSV_HEADER, CsvRow, LogRecord};
use super::retry::RetryPolicy;
use super::RecordSink;
use crate::error::{Error, Result};

/// Appends records to a CSV destination as they arrive.
///
/// Rows are encoded into an owned buffer and written out every
/// `flush_every` records. A failed write is retried from the first byte
/// the destination has not accepted, so a retry never repeats data.
#[derive(Debug)]
pub struct CsvRecordSink<W: Write = File> {
    path: Option<PathBuf>,
    out: W,
    /// Encoded rows not yet accepted by `out`
    pending: Vec<u8>,
    /// Bytes of `pending` already accepted by `out`
    accepted: usize,
    pending_rows: usize,
    flush_every: usize,
    retry: RetryPolicy,
    written: u64,
    finished: bool,
}

impl CsvRecordSink<File> {
    /// Create (or overwrite) the log at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file; missing parent directories are created
    /// * `flush_every` - Records buffered between writes; 0 or 1 writes every record
    /// * `retry` - Policy applied to every write of buffered rows
    ///
    /// # Returns
    ///
    /// A sink whose file already holds the header row, so a run without
    /// observations still leaves a valid header-only table.
    pub fn create(path: impl AsRef<Path>, flush_every: usize, retry: RetryPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        info!("Writing object stats to {}", path.display());

        let mut sink = Self::from_writer(file, flush_every, retry)?;
        sink.path = Some(path);
        Ok(sink)
    }

    /// Location of the log file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl<W: Write> CsvRecordSink<W> {
    /// Write the header to `out` at once and return a sink appending to it.
    pub fn from_writer(out: W, flush_every: usize, retry: RetryPolicy) -> Result<Self> {
        let mut sink = Self {
            path: None,
            out,
            pending: encode(|w| w.write_record(CSV_HEADER))?,
            accepted: 0,
            pending_rows: 0,
            flush_every: flush_every.max(1),
            retry,
            written: 0,
            finished: false,
        };
        sink.flush()?;
        Ok(sink)
    }

    /// Records appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// The underlying destination.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn flush(&mut self) -> Result<()> {
        let out = &mut self.out;
        let pending = &self.pending;
        let accepted = &mut self.accepted;
        self.retry
            .run("stats log write", || write_remaining(out, pending, accepted))?;
        self.pending.clear();
        self.accepted = 0;
        self.pending_rows = 0;
        Ok(())
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        if self.finished {
            return Err(Error::Finalized);
        }
        let row = encode(|w| w.serialize(CsvRow::from(record)))?;
        self.pending.extend_from_slice(&row);
        self.written += 1;
        self.pending_rows += 1;
        if self.pending_rows >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()?;
        if !self.finished {
            self.finished = true;
            debug!("Stats log closed after {} record(s)", self.written);
        }
        Ok(())
    }
}

/// Encode one record with a writer over an owned buffer.
fn encode<F>(write: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .buffer_capacity(256)
        .from_writer(Vec::new());
    write(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| Error::Io(io::Error::new(e.error().kind(), e.error().to_string())))
}

/// Write `pending[*accepted..]`, advancing `accepted` as bytes land.
fn write_remaining<W: Write>(out: &mut W, pending: &[u8], accepted: &mut usize) -> io::Result<()> {
    while *accepted < pending.len() {
        match out.write(&pending[*accepted..])? {
            0 => return Err(io::ErrorKind::WriteZero.into()),
            n => *accepted += n,
        }
    }
    out.flush()
}
