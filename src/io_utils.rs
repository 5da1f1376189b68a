//! Input plumbing: delimiter resolution and rewindable byte sources.
//!
//! The loader reads its input twice (inference pass, then COPY pass), so
//! every source must support a rewind. Regular files seek; `-` (STDIN) is
//! buffered fully into memory before the first pass, which caps STDIN input
//! at available memory.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// `-` means STDIN everywhere a path is accepted.
pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Explicit delimiter if given, otherwise tab for `.tsv` files and comma for
/// everything else.
pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

#[derive(Debug)]
enum InputKind {
    File(BufReader<File>),
    Buffered(Cursor<Vec<u8>>),
}

/// A rewindable byte source: a regular file, or all of STDIN held in memory.
#[derive(Debug)]
pub struct Input {
    inner: InputKind,
}

impl Input {
    pub fn open(path: &Path) -> Result<Self> {
        let inner = if is_dash(path) {
            let mut buffer = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buffer)
                .context("Reading from STDIN")?;
            debug!("Buffered {} byte(s) from STDIN", buffer.len());
            InputKind::Buffered(Cursor::new(buffer))
        } else {
            let file = File::open(path)
                .with_context(|| format!("Opening input file '{}'", path.display()))?;
            InputKind::File(BufReader::new(file))
        };
        Ok(Self { inner })
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            InputKind::File(reader) => reader.read(buf),
            InputKind::Buffered(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for Input {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            InputKind::File(reader) => reader.seek(pos),
            InputKind::Buffered(cursor) => cursor.seek(pos),
        }
    }
}

/// Builds the csv reader both passes share. The header row is read as an
/// ordinary record (the engine consumes it itself), quotes may contain
/// delimiters and doubled quotes, and ragged rows are read errors.
pub fn csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(reader)
}
