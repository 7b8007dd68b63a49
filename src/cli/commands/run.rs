//! Model run command

use std::path::PathBuf;

use crate::cli::commands::open_project;
use crate::cli::error::CliError;
use crate::project::{ModelRef, ModelStatus, RunOptions, RunResult};

/// Run command arguments
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Project directory
    pub project: PathBuf,
    /// Model names to run, with their upstream models
    pub select: Vec<String>,
    /// Rebuild incremental marts from scratch
    pub full_refresh: bool,
    /// Print the run result as JSON
    pub json: bool,
}

/// Parse selected model names
pub fn parse_selection(names: &[String]) -> Result<Vec<ModelRef>, CliError> {
    names
        .iter()
        .map(|name| {
            ModelRef::from_name(name)
                .ok_or_else(|| CliError::InvalidArgument(format!("Unknown model: {}", name)))
        })
        .collect()
}

/// Run the selected models and report each one
pub fn handle_run(args: &RunArgs) -> Result<(), CliError> {
    let options = RunOptions {
        select: parse_selection(&args.select)?,
        full_refresh: args.full_refresh,
    };
    let mut runner = open_project(&args.project)?;
    let result = runner.run(&options);

    if args.json {
        let output = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::IoError(format!("Failed to serialize result: {}", e)))?;
        println!("{}", output);
    } else {
        print_result(&result);
    }

    match result.count(ModelStatus::Error) {
        0 => Ok(()),
        failed => Err(CliError::ModelsFailed(failed)),
    }
}

fn print_result(result: &RunResult) {
    println!("Run {}", result.run_id);
    for (i, model) in result.models.iter().enumerate() {
        let detail = match (&model.merge, &model.message) {
            (_, Some(message)) => message.clone(),
            (Some(merge), None) => format!(
                "{} rows ({} inserted, {} updated keys{})",
                model.rows,
                merge.keys_inserted,
                merge.keys_updated,
                if merge.rebuilt { ", rebuilt" } else { "" }
            ),
            (None, None) => format!("{} rows", model.rows),
        };
        println!(
            "{:>3} of {} {:<8} {:<32} {} [{}ms]",
            i + 1,
            result.models.len(),
            model.status,
            model.model.to_string(),
            detail,
            model.duration_ms
        );
        if let Some(merge) = &model.merge {
            for change in &merge.schema_changes {
                println!("             schema change: {}", change);
            }
        }
    }
    println!(
        "Done. OK={} ERROR={} SKIP={} DISABLED={} in {}ms",
        result.count(ModelStatus::Success),
        result.count(ModelStatus::Error),
        result.count(ModelStatus::Skipped),
        result.count(ModelStatus::Disabled),
        result.duration_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mart::MartModel;

    #[test]
    fn test_parse_selection() {
        let selected =
            parse_selection(&["campsite_alerts".to_string(), "stg_doc_campsites".to_string()])
                .unwrap();
        assert_eq!(selected[0], ModelRef::Mart(MartModel::Alerts));
        assert!(parse_selection(&["nope".to_string()]).is_err());
    }
}
