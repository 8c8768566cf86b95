//! `smaster compare`: rank master series names for requested series.

use std::path::PathBuf;

use clap::Args;

use seriesmaster_config::Settings;
use seriesmaster_recon::match_series;

use crate::exit_codes::EXIT_INPUT_REJECTED;
use crate::CliError;

const RESULT_SHEET: &str = "Results";

#[derive(Args)]
pub struct CompareArgs {
    /// Table with the requested series column
    #[arg(long)]
    pub requests: PathBuf,

    /// Series table with SeriesName and UsageCount
    #[arg(long)]
    pub series: PathBuf,

    /// Optional rules table with MinUsagePercent
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Matches kept per request (default from settings)
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Output file (default: MatchedSeriesResults_<timestamp>.xlsx)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Also print the results as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from(format!(
        "MatchedSeriesResults_{}.xlsx",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

pub fn cmd_compare(args: CompareArgs, settings: &Settings) -> Result<(), CliError> {
    let top_n = args.top_n.unwrap_or(settings.compare.top_n);
    if top_n == 0 {
        return Err(CliError::args("--top-n must be at least 1"));
    }

    let requests = seriesmaster_io::read_table(&args.requests).map_err(CliError::io)?;
    let series = seriesmaster_io::read_table(&args.series).map_err(CliError::io)?;
    let rules = match &args.rules {
        Some(path) => Some(seriesmaster_io::read_table(path).map_err(CliError::io)?),
        None => None,
    };

    let results = match_series(&requests, &settings.schema.value_column, &series, rules.as_ref(), top_n)
        .map_err(|e| CliError::new(EXIT_INPUT_REJECTED, e.to_string()))?;

    let output = args.output.unwrap_or_else(default_output);
    seriesmaster_io::write_table(&results, &output, RESULT_SHEET).map_err(CliError::io)?;
    eprintln!("wrote {} ({} row(s))", output.display(), results.len());

    if args.json {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = results
            .rows
            .iter()
            .map(|row| {
                results
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(col, cell)| (col.clone(), serde_json::Value::String(cell.to_string())))
                    .collect()
            })
            .collect();
        let json_str = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }
    Ok(())
}
