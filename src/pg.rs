//! PostgreSQL plumbing: connection, DDL execution, and the binary COPY
//! driver that drains the row decoder.

use anyhow::{Context, Result};
use log::debug;
use postgres::binary_copy::BinaryCopyInWriter;
use postgres::types::ToSql;
use postgres::{Client, NoTls, Transaction};

use crate::rows::{LoadError, RowDecoder, RowSource};
use crate::schema::{self, Schema};

pub fn connect(database_url: &str) -> Result<Client> {
    debug!("Connecting to PostgreSQL");
    Client::connect(database_url, NoTls).context("Connecting to PostgreSQL")
}

pub fn drop_table(tx: &mut Transaction<'_>, table: &str) -> Result<()> {
    let statement = schema::drop_table_sql(table);
    debug!("{statement}");
    tx.execute(statement.as_str(), &[])
        .with_context(|| format!("Dropping table '{table}'"))?;
    Ok(())
}

pub fn create_table(tx: &mut Transaction<'_>, table: &str, schema: &Schema) -> Result<()> {
    let statement = schema.create_table_sql(table);
    debug!("{statement}");
    tx.execute(statement.as_str(), &[])
        .with_context(|| format!("Creating table '{table}'"))?;
    Ok(())
}

/// COPY statement naming the inferred columns in schema order, so the server
/// checks arity and order against the table it just created.
pub fn copy_statement(table: &str, schema: &Schema) -> String {
    format!(
        "copy {} ({}) from stdin binary",
        table,
        schema.column_names().join(", ")
    )
}

/// Streams every data row of `source` into `table` over binary COPY.
///
/// The source must be rewound to the very start of the input: the header row
/// is consumed and discarded here so that line numbers in errors match the
/// inference pass. Returns the row count reported by the server.
pub fn copy_rows<S: RowSource>(
    tx: &mut Transaction<'_>,
    table: &str,
    schema: &Schema,
    source: &mut S,
) -> Result<u64> {
    match source.next_row() {
        Ok(Some(_)) => {}
        Ok(None) => return Err(LoadError::UnexpectedEof { line: 1 }.into()),
        Err(source) => return Err(LoadError::SourceRead { line: 1, source }.into()),
    }

    let statement = copy_statement(table, schema);
    debug!("{statement}");
    let types = schema.pg_types();
    let sink = tx
        .copy_in(statement.as_str())
        .with_context(|| format!("Starting COPY into '{table}'"))?;
    let mut writer = BinaryCopyInWriter::new(sink, &types);

    let mut rows = RowDecoder::new(schema, source);
    while rows.advance() {
        let values = rows.values()?;
        let params: Vec<&(dyn ToSql + Sync)> = values
            .iter()
            .map(|value| value as &(dyn ToSql + Sync))
            .collect();
        writer.write(&params).context("Writing row to COPY stream")?;
    }
    if let Some(err) = rows.take_error() {
        return Err(err.into());
    }
    writer.finish().context("Finishing COPY")
}
