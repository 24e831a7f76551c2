//! Output sinks: ordered, append-only destinations written only by the collector.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Append-only destination for accepted entries, in acceptance order.
pub trait Sink {
    fn append(&mut self, entry: &str) -> io::Result<()>;

    /// Make everything appended so far durable. Called once when the run drains.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for Vec<String> {
    fn append(&mut self, entry: &str) -> io::Result<()> {
        self.push(entry.to_string());
        Ok(())
    }
}

/// Single-column CSV writer on [`csv::Writer`].
///
/// The writer buffers rows; they are durable after [`Sink::flush`], which the supervisor
/// calls while draining. A write error can surface on a later append or on that flush.
pub struct CsvSink<W: Write> {
    out: csv::Writer<W>,
    rows: usize,
}

fn csv_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.terminator(csv::Terminator::Any(b'\n'));
    builder
}

impl CsvSink<File> {
    /// Create (truncate) `path` and write the header row.
    pub fn create(path: &Path, header: Option<&str>) -> io::Result<Self> {
        Self::with_writer(csv_builder().from_path(path)?, header)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W, header: Option<&str>) -> io::Result<Self> {
        Self::with_writer(csv_builder().from_writer(writer), header)
    }

    fn with_writer(mut out: csv::Writer<W>, header: Option<&str>) -> io::Result<Self> {
        if let Some(h) = header {
            out.write_record([h])?;
        }
        Ok(Self { out, rows: 0 })
    }

    /// Data rows written (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.out
            .into_inner()
            .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))
    }
}

impl<W: Write> Sink for CsvSink<W> {
    fn append(&mut self, entry: &str) -> io::Result<()> {
        self.out.write_record([entry])?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
