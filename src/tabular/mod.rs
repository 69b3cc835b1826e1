//! Header-driven CSV reading in bounded batches.
//!
//! Columns are mapped to record fields by header name. A row that cannot be
//! deserialized is reported through the error callback and skipped; an I/O
//! failure ends the stream with an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use serde::de::DeserializeOwned;

/// A row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line number in the source, when known
    pub line: Option<u64>,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl RowError {
    fn from_csv(error: &csv::Error) -> Self {
        let line = error.position().map(|p| p.line());
        let message = match error.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
            _ => error.to_string(),
        };
        Self { line, message }
    }
}

/// Iterator over batches of at most `batch_size` records.
pub struct BatchReader<R, T, F> {
    records: DeserializeRecordsIntoIter<R, T>,
    batch_size: usize,
    on_error: F,
    done: bool,
}

impl<R, T, F> BatchReader<R, T, F>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(RowError),
{
    /// Reads a headed CSV stream. `batch_size` of zero is treated as one.
    pub fn new(source: R, batch_size: usize, on_error: F) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(source);
        Self {
            records: reader.into_deserialize(),
            batch_size: batch_size.max(1),
            on_error,
            done: false,
        }
    }
}

impl<T, F> BatchReader<File, T, F>
where
    T: DeserializeOwned,
    F: FnMut(RowError),
{
    pub fn from_path(path: &Path, batch_size: usize, on_error: F) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file, batch_size, on_error))
    }
}

impl<R, T, F> Iterator for BatchReader<R, T, F>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(RowError),
{
    type Item = Result<Vec<T>, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.records.next() {
                Some(Ok(record)) => batch.push(record),
                Some(Err(err)) if err.is_io_error() => {
                    self.done = true;
                    return Some(Err(err));
                }
                Some(Err(err)) => (self.on_error)(RowError::from_csv(&err)),
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
