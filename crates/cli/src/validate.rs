//! `smaster validate`: header and request-count check for an input batch.

use std::path::PathBuf;

use seriesmaster_config::Settings;
use seriesmaster_recon::summarize_input;

use crate::exit_codes::EXIT_INPUT_REJECTED;
use crate::CliError;

pub fn cmd_validate(input: PathBuf, json: bool, settings: &Settings) -> Result<(), CliError> {
    let table = seriesmaster_io::read_table(&input).map_err(CliError::io)?;
    let summary = summarize_input(&table, &settings.schema);

    if json {
        let json_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        eprintln!("{}: {} row(s)", input.display(), summary.total_rows);
        eprintln!("  delete requests: {}", summary.delete_rows);
        eprintln!("  update requests: {}", summary.update_rows);
        if summary.is_valid() {
            eprintln!("  all required columns present");
        }
    }

    if !summary.is_valid() {
        return Err(CliError::new(
            EXIT_INPUT_REJECTED,
            format!("missing required columns: {}", summary.missing_columns.join(", ")),
        )
        .with_hint("run `smaster template` for a batch with the required headers"));
    }
    Ok(())
}
