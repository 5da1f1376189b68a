//! pgload: load delimited text files into PostgreSQL tables whose schemas
//! are inferred from the data itself.
//!
//! The engine reads the input twice. The first pass scans every row and
//! narrows each column to the tightest type that accepts all of its values;
//! the second pass streams the same rows into a freshly created table over
//! binary COPY. Both passes share one csv reader configuration and one
//! line-numbering scheme, so errors from either pass point at the same
//! place in the input.

pub mod cli;
pub mod data;
pub mod io_utils;
pub mod load;
pub mod pg;
pub mod rows;
pub mod schema;
pub mod table;

use std::env;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands, DdlArgs, ProbeArgs};

static LOGGER: OnceLock<()> = OnceLock::new();

/// Initializes env_logger once. `RUST_LOG` wins when set; otherwise this
/// crate logs at info and everything else stays quiet.
fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_level(LevelFilter::Off);
            builder.filter_module("pgload", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

/// Parses the command line and runs the chosen command.
pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Load(args) => load::execute(&args),
        Commands::Ddl(args) => handle_ddl(&args),
        Commands::Probe(args) => handle_probe(&args),
    }
}

/// Prints the statements `load` would execute. Output is bare SQL on stdout,
/// one statement per line, so it can be piped straight into psql.
fn handle_ddl(args: &DdlArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let table = schema::derive_table_name(args.table.as_deref(), &args.input);
    let mut input = io_utils::Input::open(&args.input)?;
    let mut reader = io_utils::csv_reader(&mut input, delimiter);
    let inferred = schema::infer_schema(&mut reader)
        .with_context(|| format!("Analyzing '{}'", args.input.display()))?;

    if args.drop_table {
        println!("{};", schema::drop_table_sql(&table));
    }
    println!("{};", inferred.create_table_sql(&table));
    Ok(())
}

fn handle_probe(args: &ProbeArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let mut input = io_utils::Input::open(&args.input)?;
    let mut reader = io_utils::csv_reader(&mut input, delimiter);
    let (inferred, report) = schema::infer_schema_with_report(&mut reader)
        .with_context(|| format!("Analyzing '{}'", args.input.display()))?;

    if args.json {
        let columns: Vec<serde_json::Value> = inferred
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                serde_json::json!({
                    "name": column.name,
                    "data_type": column.data_type,
                    "not_null": column.not_null,
                    "values": report.value_count(idx),
                    "nulls": report.null_count(idx),
                    "sample": report.sample_value(idx),
                })
            })
            .collect();
        let payload = serde_json::json!({
            "rows_read": report.rows_read(),
            "columns": columns,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let headers: Vec<String> = ["column", "type", "not null", "values", "nulls", "sample"]
            .iter()
            .map(|header| header.to_string())
            .collect();
        let rows: Vec<Vec<String>> = inferred
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let not_null = if column.not_null { "yes" } else { "no" };
                vec![
                    column.name.clone(),
                    column.data_type.to_string(),
                    not_null.to_string(),
                    report.value_count(idx).to_string(),
                    report.null_count(idx).to_string(),
                    report.sample_value(idx).unwrap_or("").to_string(),
                ]
            })
            .collect();
        table::print_table(&headers, &rows);
        info!("Scanned {} data row(s)", report.rows_read());
    }
    Ok(())
}

/// Delimiter byte as something printable in log lines.
pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
