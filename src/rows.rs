//! Row streaming: the pull-based source seam and the decoder that feeds the
//! bulk COPY writer one typed row at a time.

use std::io::Read;

use csv::StringRecord;
use thiserror::Error;

use crate::data::{SqlValue, parse_typed_value};
use crate::schema::Schema;

/// Errors raised while streaming rows through either pass. Every variant
/// carries the 1-based line it was detected on, where the header is line 1
/// and each record counts as one line even when quoting spans several.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The underlying reader failed mid-stream.
    #[error("line {line}: {source}")]
    SourceRead { line: u64, source: csv::Error },
    /// The input ended where a header row was required.
    #[error("line {line}: unexpected end of input")]
    UnexpectedEof { line: u64 },
    /// A data row did not match the header width.
    #[error("line {line}: expected {expected} field(s), found {found}")]
    RowLength { line: u64, expected: usize, found: usize },
    /// A field could not be decoded as its column's resolved type.
    #[error("line {line}: column {column}: {message}")]
    Decode { line: u64, column: String, message: String },
}

/// Pull-based supplier of raw rows.
///
/// `Ok(None)` is a clean end of data; `Err` is a read failure. A source is
/// consumed once per pass, so two-pass callers rewind the underlying input
/// and build a fresh source for the second pass.
pub trait RowSource {
    fn next_row(&mut self) -> csv::Result<Option<StringRecord>>;
}

impl<R: Read> RowSource for csv::Reader<R> {
    fn next_row(&mut self) -> csv::Result<Option<StringRecord>> {
        let mut record = StringRecord::new();
        if self.read_record(&mut record)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

/// Decodes raw rows against a resolved schema, one buffered row at a time.
///
/// Drive it with [`advance`](Self::advance) and [`values`](Self::values).
/// `advance` returning `false` means either clean end of data or a failure;
/// [`last_error`](Self::last_error) tells the two apart. Once an error is
/// recorded the decoder is spent: further `advance` calls return `false`
/// without touching the source. The source must already be positioned past
/// the header row, which is line 1 of the input.
pub struct RowDecoder<'a, S: RowSource> {
    schema: &'a Schema,
    source: &'a mut S,
    current: StringRecord,
    line: u64,
    error: Option<LoadError>,
}

impl<'a, S: RowSource> RowDecoder<'a, S> {
    pub fn new(schema: &'a Schema, source: &'a mut S) -> Self {
        Self {
            schema,
            source,
            current: StringRecord::new(),
            line: 1,
            error: None,
        }
    }

    /// Buffers the next raw row. Returns `false` at end of data or on a read
    /// failure; the failure is recorded for [`last_error`](Self::last_error).
    pub fn advance(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.source.next_row() {
            Ok(Some(record)) => {
                self.line += 1;
                self.current = record;
                true
            }
            Ok(None) => false,
            Err(source) => {
                self.error = Some(LoadError::SourceRead { line: self.line + 1, source });
                false
            }
        }
    }

    /// Decodes the buffered row in schema order. Empty fields decode to
    /// `None`, which the COPY writer encodes as SQL NULL. The first failure
    /// is both recorded and returned.
    pub fn values(&mut self) -> Result<Vec<Option<SqlValue>>, LoadError> {
        let expected = self.schema.columns.len();
        let found = self.current.len();
        if found != expected {
            self.error = Some(LoadError::RowLength { line: self.line, expected, found });
            return Err(LoadError::RowLength { line: self.line, expected, found });
        }

        let schema = self.schema;
        let mut values = Vec::with_capacity(expected);
        for (column, field) in schema.columns.iter().zip(self.current.iter()) {
            match parse_typed_value(field, &column.data_type) {
                Ok(value) => values.push(value),
                Err(err) => {
                    let message = err.to_string();
                    self.error = Some(LoadError::Decode {
                        line: self.line,
                        column: column.name.clone(),
                        message: message.clone(),
                    });
                    return Err(LoadError::Decode {
                        line: self.line,
                        column: column.name.clone(),
                        message,
                    });
                }
            }
        }
        Ok(values)
    }

    /// The error, if any, that stopped this stream.
    pub fn last_error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<LoadError> {
        self.error.take()
    }
}
