//! Typed cell values and the parsers that turn raw fields into them.

use std::error::Error as StdError;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use bytes::BytesMut;
use chrono::NaiveDate;
use postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use rust_decimal::Decimal;

use crate::schema::ColumnType;

/// A single decoded cell, ready to be written to a binary COPY stream.
///
/// NULL is represented outside this enum: decoded rows carry
/// `Option<SqlValue>`, and `None` encodes as SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i32),
    BigInt(i64),
    Numeric(Decimal),
    Date(NaiveDate),
    Boolean(bool),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            SqlValue::Integer(value) => value.to_sql(ty, out),
            SqlValue::BigInt(value) => value.to_sql(ty, out),
            SqlValue::Numeric(value) => value.to_sql(ty, out),
            SqlValue::Date(value) => value.to_sql(ty, out),
            SqlValue::Boolean(value) => value.to_sql(ty, out),
            SqlValue::Text(value) => value.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        [
            Type::INT4,
            Type::INT8,
            Type::NUMERIC,
            Type::DATE,
            Type::BOOL,
            Type::TEXT,
            Type::VARCHAR,
        ]
        .contains(ty)
    }

    to_sql_checked!();
}

/// Parses a raw field as `data_type`. An empty field is NULL for every type,
/// including text; no trimming is applied, so `" 1"` is not an integer.
pub fn parse_typed_value(value: &str, data_type: &ColumnType) -> Result<Option<SqlValue>> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = match data_type {
        ColumnType::Integer => {
            let number: i32 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as integer"))?;
            SqlValue::Integer(number)
        }
        ColumnType::BigInt => {
            let number: i64 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as bigint"))?;
            SqlValue::BigInt(number)
        }
        ColumnType::Numeric => SqlValue::Numeric(parse_numeric(value)?),
        ColumnType::Date => SqlValue::Date(parse_date(value)?),
        ColumnType::Boolean => SqlValue::Boolean(parse_bool(value)?),
        ColumnType::Text => SqlValue::Text(value.to_string()),
    };
    Ok(Some(parsed))
}

/// Accepts plain decimal notation and scientific notation ("1.5e3").
pub fn parse_numeric(value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .with_context(|| format!("Failed to parse '{value}' as numeric"))
}

/// ISO 8601 calendar dates only (`YYYY-MM-DD`).
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse '{value}' as date"))
}

pub fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => bail!("Failed to parse '{value}' as boolean"),
    }
}
