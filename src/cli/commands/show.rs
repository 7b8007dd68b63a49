//! Table inspection command

use std::path::PathBuf;

use serde_json::json;

use crate::cli::commands::open_project;
use crate::cli::error::CliError;
use crate::models::{Row, TableSchema};
use crate::project::ModelRef;
use crate::storage::WarehouseStore;

/// Show command arguments
#[derive(Debug, Clone)]
pub struct ShowArgs {
    /// Project directory
    pub project: PathBuf,
    /// Mart, staging model or raw table to print; lists tables when absent
    pub table: Option<String>,
    /// Maximum number of rows to print
    pub limit: usize,
    /// Print as JSON
    pub json: bool,
}

/// List persisted tables or print the rows of one
pub fn handle_show(args: &ShowArgs) -> Result<(), CliError> {
    let runner = open_project(&args.project)?;
    let store = runner.store();

    let Some(name) = &args.table else {
        for raw in store.raw_tables()? {
            let rows = store.load_raw(&raw)?.map(|t| t.len()).unwrap_or(0);
            println!("raw   {:<32} {} rows", raw, rows);
        }
        for mart in store.mart_tables()? {
            let rows = store.load_mart(&mart)?.map(|t| t.row_count()).unwrap_or(0);
            println!("mart  {:<32} {} rows", mart, rows);
        }
        return Ok(());
    };

    if let Some(table) = store.load_mart(name)? {
        let rows: Vec<&Row> = table.rows().take(args.limit).collect();
        return print_rows(&table.schema, &rows, table.row_count(), args.json);
    }

    if let Some(ModelRef::Staging(model)) = ModelRef::from_name(name) {
        let batch = runner.stage(model)?.to_batch();
        let rows: Vec<&Row> = batch.rows.iter().map(|r| &r.row).take(args.limit).collect();
        return print_rows(&batch.schema, &rows, batch.len(), args.json);
    }

    if let Some(table) = store.load_raw(name)? {
        for record in table.records().iter().take(args.limit) {
            if args.json {
                let line = json!({
                    "id": record.id,
                    "source": record.source_path(),
                    "loadedAt": record.loaded_at,
                });
                println!("{}", line);
            } else {
                println!(
                    "{:>6}  {}  {}",
                    record.id,
                    record.loaded_at.to_rfc3339(),
                    record.source_path()
                );
            }
        }
        return Ok(());
    }

    Err(CliError::InvalidArgument(format!("Unknown table: {}", name)))
}

fn print_rows(
    schema: &TableSchema,
    rows: &[&Row],
    total: usize,
    as_json: bool,
) -> Result<(), CliError> {
    if as_json {
        let output = serde_json::to_string_pretty(&json!({"schema": schema, "rows": rows}))
            .map_err(|e| CliError::IoError(format!("Failed to serialize rows: {}", e)))?;
        println!("{}", output);
        return Ok(());
    }

    let names = schema.names();
    println!(
        "{}",
        schema
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join(" | ")
    );
    for row in rows {
        let cells: Vec<String> = names
            .iter()
            .map(|name| row.get(*name).map(|v| v.render()).unwrap_or_default())
            .collect();
        println!("{}", cells.join(" | "));
    }
    if total > rows.len() {
        println!("... {} more rows", total - rows.len());
    }
    Ok(())
}
