//! Schema inference and DDL rendering.
//!
//! Column types are inferred by elimination: every column starts with the
//! full candidate list and each observed value discards the candidates it
//! fails to parse as. When the scan ends, the highest-priority survivor wins;
//! a column whose list empties out falls back to `text`. Priority is the
//! declaration order of [`CANDIDATE_TYPES`], so once a candidate is gone it
//! can never come back, and scanning more rows can only widen a column.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use postgres::types::Type;
use regex::Regex;
use serde::Serialize;

use crate::data::parse_typed_value;
use crate::rows::{LoadError, RowSource};

/// Candidate column types, narrowest first. `Text` is the fallback and is
/// never probed.
pub const CANDIDATE_TYPES: [ColumnType; 5] = [
    ColumnType::Integer,
    ColumnType::BigInt,
    ColumnType::Numeric,
    ColumnType::Date,
    ColumnType::Boolean,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    BigInt,
    Numeric,
    Date,
    Boolean,
    Text,
}

impl ColumnType {
    /// Type name as it appears in rendered DDL.
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Boolean => "bool",
            ColumnType::Text => "text",
        }
    }

    /// Wire type used on the binary COPY stream.
    pub fn pg_type(&self) -> Type {
        match self {
            ColumnType::Integer => Type::INT4,
            ColumnType::BigInt => Type::INT8,
            ColumnType::Numeric => Type::NUMERIC,
            ColumnType::Date => Type::DATE,
            ColumnType::Boolean => Type::BOOL,
            ColumnType::Text => Type::TEXT,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn pg_types(&self) -> Vec<Type> {
        self.columns.iter().map(|column| column.data_type.pg_type()).collect()
    }

    /// Renders `create table` DDL, without a trailing semicolon.
    pub fn create_table_sql(&self, table: &str) -> String {
        let mut sql = format!("create table {table} (");
        for (idx, column) in self.columns.iter().enumerate() {
            if idx > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&column.name);
            sql.push(' ');
            sql.push_str(column.data_type.sql_name());
            if column.not_null {
                sql.push_str(" not null");
            }
        }
        sql.push(')');
        sql
    }
}

pub fn drop_table_sql(table: &str) -> String {
    format!("drop table if exists {table}")
}

/// Per-column elimination state for one inference pass.
#[derive(Debug, Clone)]
struct ColumnAnalyzer {
    candidates: Vec<ColumnType>,
    values_seen: u64,
    nulls_seen: u64,
}

impl ColumnAnalyzer {
    fn new() -> Self {
        Self {
            candidates: CANDIDATE_TYPES.to_vec(),
            values_seen: 0,
            nulls_seen: 0,
        }
    }

    fn observe(&mut self, field: &str) {
        if field.is_empty() {
            self.nulls_seen += 1;
            return;
        }
        self.values_seen += 1;
        self.candidates
            .retain(|candidate| parse_typed_value(field, candidate).is_ok());
    }

    /// First surviving candidate, or the `text` fallback. A column that never
    /// saw a non-empty value proved nothing, so it is text as well. NOT NULL
    /// requires at least one non-empty value and no empty ones, which keeps a
    /// column with no data at all nullable.
    fn resolve(&self) -> (ColumnType, bool) {
        let data_type = if self.values_seen == 0 {
            ColumnType::Text
        } else {
            self.candidates.first().copied().unwrap_or(ColumnType::Text)
        };
        let not_null = self.nulls_seen == 0 && self.values_seen > 0;
        (data_type, not_null)
    }
}

/// Null and sample statistics gathered alongside inference.
#[derive(Debug, Clone)]
pub struct InferenceReport {
    rows_read: u64,
    value_counts: Vec<u64>,
    null_counts: Vec<u64>,
    samples: Vec<Option<String>>,
}

impl InferenceReport {
    /// Data rows scanned, excluding the header.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn value_count(&self, index: usize) -> u64 {
        self.value_counts.get(index).copied().unwrap_or(0)
    }

    pub fn null_count(&self, index: usize) -> u64 {
        self.null_counts.get(index).copied().unwrap_or(0)
    }

    /// First non-empty value observed in the column, if any.
    pub fn sample_value(&self, index: usize) -> Option<&str> {
        self.samples.get(index).and_then(|sample| sample.as_deref())
    }
}

/// Scans `source` to the end and infers a schema from it.
///
/// The first row is the header; its fields become column names after
/// normalization (a header that normalizes to nothing is named by position).
/// Every following row must match the header width. The source is left fully
/// consumed, so callers that need the data again must rewind the underlying
/// input themselves.
pub fn infer_schema_with_report<S: RowSource>(
    source: &mut S,
) -> Result<(Schema, InferenceReport), LoadError> {
    let mut line: u64 = 1;
    let header = match source.next_row() {
        Ok(Some(record)) => record,
        Ok(None) => return Err(LoadError::UnexpectedEof { line }),
        Err(source) => return Err(LoadError::SourceRead { line, source }),
    };

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let name = normalize_identifier(raw);
            if name.is_empty() { format!("column_{}", idx + 1) } else { name }
        })
        .collect();

    let mut analyzers = vec![ColumnAnalyzer::new(); names.len()];
    let mut samples: Vec<Option<String>> = vec![None; names.len()];
    let mut rows_read: u64 = 0;
    loop {
        line += 1;
        match source.next_row() {
            Ok(Some(record)) => {
                if record.len() != analyzers.len() {
                    return Err(LoadError::RowLength {
                        line,
                        expected: analyzers.len(),
                        found: record.len(),
                    });
                }
                for (idx, field) in record.iter().enumerate() {
                    analyzers[idx].observe(field);
                    if samples[idx].is_none() && !field.is_empty() {
                        samples[idx] = Some(field.to_string());
                    }
                }
                rows_read += 1;
            }
            Ok(None) => break,
            Err(source) => return Err(LoadError::SourceRead { line, source }),
        }
    }

    let columns = names
        .into_iter()
        .zip(&analyzers)
        .map(|(name, analyzer)| {
            let (data_type, not_null) = analyzer.resolve();
            Column { name, data_type, not_null }
        })
        .collect();
    let report = InferenceReport {
        rows_read,
        value_counts: analyzers.iter().map(|analyzer| analyzer.values_seen).collect(),
        null_counts: analyzers.iter().map(|analyzer| analyzer.nulls_seen).collect(),
        samples,
    };
    Ok((Schema { columns }, report))
}

/// [`infer_schema_with_report`] without the statistics.
pub fn infer_schema<S: RowSource>(source: &mut S) -> Result<Schema, LoadError> {
    let (schema, _) = infer_schema_with_report(source)?;
    Ok(schema)
}

static IDENTIFIER_RUNS: OnceLock<Regex> = OnceLock::new();

/// Collapses every run of characters outside `[0-9A-Za-z_]` into a single
/// underscore and lower-cases the result. The class is ASCII on purpose:
/// accented or non-Latin header text maps to underscores rather than passing
/// through unquoted into DDL.
pub fn normalize_identifier(raw: &str) -> String {
    let runs = IDENTIFIER_RUNS
        .get_or_init(|| Regex::new(r"[^0-9A-Za-z_]+").expect("fixed identifier pattern"));
    runs.replace_all(raw, "_").to_ascii_lowercase()
}

/// Picks the target table name: an explicit name is taken verbatim, STDIN
/// input becomes `stdin`, and anything else is the normalized file stem.
pub fn derive_table_name(explicit: Option<&str>, input: &Path) -> String {
    if let Some(name) = explicit {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    if crate::io_utils::is_dash(input) {
        return "stdin".to_string();
    }
    let stem = input.file_stem().and_then(|stem| stem.to_str()).unwrap_or("");
    let normalized = normalize_identifier(stem);
    if normalized.is_empty() { "data".to_string() } else { normalized }
}
