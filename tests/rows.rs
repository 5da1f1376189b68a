//! The streaming decode protocol, driven over real csv readers the way the
//! COPY pass drives it: infer on one pass, rewind, decode on the next.

use std::io::Cursor;

use chrono::NaiveDate;
use pgload::data::SqlValue;
use pgload::io_utils::csv_reader;
use pgload::rows::{LoadError, RowDecoder, RowSource};
use pgload::schema::infer_schema;
use rust_decimal::Decimal;

/// Runs the two-pass protocol over in-memory data and collects every decoded
/// row, mirroring what the COPY driver does with the decoder.
fn decode_all(data: &str) -> Result<Vec<Vec<Option<SqlValue>>>, LoadError> {
    let mut reader = csv_reader(Cursor::new(data.to_string()), b',');
    let schema = infer_schema(&mut reader).unwrap();

    let mut reader = csv_reader(Cursor::new(data.to_string()), b',');
    reader.next_row().unwrap();
    let mut decoder = RowDecoder::new(&schema, &mut reader);
    let mut rows = Vec::new();
    while decoder.advance() {
        rows.push(decoder.values()?);
    }
    match decoder.take_error() {
        Some(err) => Err(err),
        None => Ok(rows),
    }
}

#[test]
fn decodes_every_inferred_type() {
    let rows = decode_all(
        "id,big,amount,when,flag,note\n\
         1,2147483648,1.5,2024-01-01,true,alpha\n\
         2,3,2,1999-12-31,f,\n",
    )
    .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![
            Some(SqlValue::Integer(1)),
            Some(SqlValue::BigInt(2_147_483_648)),
            Some(SqlValue::Numeric(Decimal::new(15, 1))),
            Some(SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())),
            Some(SqlValue::Boolean(true)),
            Some(SqlValue::Text("alpha".to_string())),
        ]
    );
    assert_eq!(rows[1][5], None, "empty text field must decode to NULL");
}

#[test]
fn blank_integer_field_loads_as_null() {
    let rows = decode_all("id,name\n1,a\n2,b\n,c\n").unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], Some(SqlValue::Integer(1)));
    assert_eq!(rows[2][0], None);
    assert_eq!(rows[2][1], Some(SqlValue::Text("c".to_string())));
}

#[test]
fn clean_end_leaves_no_error_behind() {
    let data = "a\n1\n2\n";
    let mut reader = csv_reader(Cursor::new(data.to_string()), b',');
    let schema = infer_schema(&mut reader).unwrap();

    let mut reader = csv_reader(Cursor::new(data.to_string()), b',');
    reader.next_row().unwrap();
    let mut decoder = RowDecoder::new(&schema, &mut reader);
    while decoder.advance() {
        decoder.values().unwrap();
    }
    assert!(decoder.last_error().is_none());
    // A spent decoder stays spent.
    assert!(!decoder.advance());
}

#[test]
fn ragged_row_surfaces_as_a_read_error_with_line_number() {
    let mut reader = csv_reader(Cursor::new("a,b\n1,2\n".to_string()), b',');
    let schema = infer_schema(&mut reader).unwrap();

    let mut reader = csv_reader(Cursor::new("a,b\n1,2\n3\n4,5\n".to_string()), b',');
    reader.next_row().unwrap();
    let mut decoder = RowDecoder::new(&schema, &mut reader);
    assert!(decoder.advance());
    decoder.values().unwrap();

    assert!(!decoder.advance());
    let err = decoder.take_error().unwrap();
    match &err {
        LoadError::SourceRead { line, .. } => assert_eq!(*line, 3),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("line 3:"), "{err}");
}

#[test]
fn crlf_input_decodes_like_lf_input() {
    let rows = decode_all("a,b\r\n1,x\r\n2,y\r\n").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], Some(SqlValue::Integer(2)));
    assert_eq!(rows[1][1], Some(SqlValue::Text("y".to_string())));
}

#[test]
fn quoted_delimiters_and_newlines_stay_inside_fields() {
    let rows = decode_all("id,note\n1,\"a,b\"\n2,\"line1\nline2\"\n").unwrap();
    assert_eq!(rows[0][1], Some(SqlValue::Text("a,b".to_string())));
    assert_eq!(rows[1][1], Some(SqlValue::Text("line1\nline2".to_string())));
}

#[test]
fn multiline_records_count_as_one_line() {
    // The quoted field spans two physical lines but is one record, and line
    // numbers count records.
    let rows = decode_all("a,b\n\"x\ny\",1\n2,3\n").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], Some(SqlValue::Text("x\ny".to_string())));

    let mut reader = csv_reader(Cursor::new("a,b\n\"x\ny\",1\n2\n".to_string()), b',');
    let err = infer_schema(&mut reader).unwrap_err();
    assert!(err.to_string().starts_with("line 3:"), "{err}");
}
