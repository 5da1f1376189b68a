//! The end-to-end load pipeline: infer on the first pass, create the table,
//! rewind, and COPY on the second pass, all inside one transaction.

use std::io::Seek;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::cli::LoadArgs;
use crate::{io_utils, pg, printable_delimiter, schema};

pub fn execute(args: &LoadArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    info!(
        "Loading '{}' (delimiter '{}')",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let table = schema::derive_table_name(args.table.as_deref(), &args.input);
    let mut input = io_utils::Input::open(&args.input)?;

    let mut client = pg::connect(&args.database_url)?;

    let mut reader = io_utils::csv_reader(&mut input, delimiter);
    let (inferred, report) = schema::infer_schema_with_report(&mut reader)
        .with_context(|| format!("Analyzing '{}'", args.input.display()))?;
    drop(reader);
    info!(
        "Inferred {} column(s) from {} data row(s)",
        inferred.columns.len(),
        report.rows_read()
    );
    for column in &inferred.columns {
        debug!(
            "  {} {}{}",
            column.name,
            column.data_type,
            if column.not_null { " not null" } else { "" }
        );
    }

    let mut tx = client.transaction().context("Starting transaction")?;
    if args.drop_table {
        pg::drop_table(&mut tx, &table)?;
    }
    pg::create_table(&mut tx, &table, &inferred)?;

    input.rewind().context("Rewinding input for the load pass")?;
    let mut reader = io_utils::csv_reader(&mut input, delimiter);
    let loaded = pg::copy_rows(&mut tx, &table, &inferred, &mut reader)
        .with_context(|| format!("Loading into '{table}'"))?;
    tx.commit().context("Committing transaction")?;

    info!("Loaded {loaded} row(s) into '{table}'");
    Ok(())
}
