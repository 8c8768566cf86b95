//! `smaster update`: reconcile one input batch against the master.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use seriesmaster_config::Settings;
use seriesmaster_io::{load_master, save_master, write_audit_log, MasterStatus};
use seriesmaster_publish::PublishResult;
use seriesmaster_recon::{reconcile, summarize_input, ReconCounts};

use crate::exit_codes::EXIT_INPUT_REJECTED;
use crate::publish::{publish_file, PublishArgs};
use crate::CliError;

#[derive(Args)]
pub struct UpdateArgs {
    /// Input batch (CSV or Excel) with key columns, RequestedSeries and "is delete"
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Master file (default from settings)
    #[arg(long, short = 'm')]
    pub master: Option<PathBuf>,

    /// Master worksheet name (default from settings)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Directory for the audit log (default from settings)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Reconcile and write the audit log, but leave the master untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Output the run report as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write the run report JSON to a file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Upload the written master to GitHub afterwards
    #[arg(long)]
    pub publish: bool,

    #[command(flatten)]
    pub target: PublishArgs,
}

/// Machine-readable result of one run.
#[derive(Debug, Serialize)]
pub struct ReconReport {
    pub input: String,
    pub master: String,
    pub master_status: &'static str,
    pub audit_log: String,
    pub dry_run: bool,
    pub rejected: bool,
    pub missing_columns: Vec<String>,
    pub rows_processed: usize,
    pub counts: ReconCounts,
    /// Audit entries per action
    pub actions: BTreeMap<String, usize>,
    pub master_rows_before: usize,
    pub master_rows_after: usize,
    pub master_written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,
}

fn status_name(status: &MasterStatus) -> &'static str {
    match status {
        MasterStatus::Loaded => "loaded",
        MasterStatus::SheetFallback(_) => "sheet_fallback",
        MasterStatus::Missing => "missing",
        MasterStatus::NoSheets => "no_sheets",
    }
}

pub fn cmd_update(args: UpdateArgs, settings: &Settings) -> Result<(), CliError> {
    let schema = &settings.schema;
    let master_path = args.master.clone().unwrap_or_else(|| settings.master.path.clone());
    let sheet = args.sheet.clone().unwrap_or_else(|| settings.master.sheet.clone());
    let log_dir = args.log_dir.clone().unwrap_or_else(|| settings.logs.dir.clone());

    if args.publish && args.dry_run {
        return Err(CliError::args("--publish cannot be combined with --dry-run"));
    }
    // A bad target must fail before the master is rewritten
    let publish_target = match args.publish {
        true => Some(args.target.target(settings)?),
        false => None,
    };

    let input = seriesmaster_io::read_table(&args.input).map_err(CliError::io)?;
    let summary = summarize_input(&input, schema);
    eprintln!(
        "input: {} row(s), {} delete request(s), {} update request(s)",
        summary.total_rows, summary.delete_rows, summary.update_rows
    );

    let loaded = load_master(&master_path, &sheet, schema).map_err(CliError::io)?;
    let outcome = reconcile(&input, &loaded.table, schema);

    let audit_path = write_audit_log(&log_dir, &outcome.audit).map_err(CliError::io)?;

    let mut master_written = false;
    if !outcome.rejected && !args.dry_run {
        save_master(&outcome.master, &master_path, &sheet).map_err(CliError::io)?;
        master_written = true;
    }

    let mut publish = None;
    let mut publish_failure = None;
    if let (Some(target), true) = (&publish_target, master_written) {
        match publish_file(&master_path, target, &args.target, settings) {
            Ok(result) => publish = Some(result),
            Err(e) => publish_failure = Some(e),
        }
    }

    let report = ReconReport {
        input: args.input.display().to_string(),
        master: master_path.display().to_string(),
        master_status: status_name(&loaded.status),
        audit_log: audit_path.display().to_string(),
        dry_run: args.dry_run,
        rejected: outcome.rejected,
        missing_columns: outcome.missing_columns.clone(),
        rows_processed: outcome.rows_processed,
        counts: outcome.counts,
        actions: outcome
            .action_counts()
            .into_iter()
            .map(|(a, n)| (a.as_str().to_string(), n))
            .collect(),
        master_rows_before: loaded.table.len(),
        master_rows_after: outcome.master.len(),
        master_written,
        publish,
        publish_error: publish_failure.as_ref().map(|e| e.message.clone()),
    };

    emit_report(&report, args.json, args.output.as_ref())?;
    print_summary(&report, &outcome.counts);

    if outcome.rejected {
        let reason = match outcome.missing_columns.is_empty() {
            true => "invalid schema".to_string(),
            false => format!("missing required columns {}", outcome.missing_columns.join(", ")),
        };
        return Err(CliError::new(EXIT_INPUT_REJECTED, format!("input rejected: {reason}"))
            .with_hint("run `smaster template` for a batch with the required headers"));
    }
    if let Some(e) = publish_failure {
        return Err(e);
    }
    Ok(())
}

fn emit_report(report: &ReconReport, json: bool, output: Option<&PathBuf>) -> Result<(), CliError> {
    if !json && output.is_none() {
        return Ok(());
    }
    let json_str = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &json_str).map_err(|e| {
            CliError::new(crate::exit_codes::EXIT_WRITE, format!("cannot write {}: {e}", path.display()))
        })?;
        eprintln!("wrote {}", path.display());
    }
    if json {
        println!("{json_str}");
    }
    Ok(())
}

fn print_summary(report: &ReconReport, counts: &ReconCounts) {
    let prefix = if report.dry_run { "dry-run: " } else { "" };
    if report.rejected {
        eprintln!("{prefix}input rejected; master unchanged");
    } else {
        eprintln!(
            "{prefix}{} row(s) processed: {} record(s) updated, {} deleted, {} skipped",
            report.rows_processed, counts.updates, counts.deletions, counts.skipped
        );
    }
    eprintln!("{prefix}audit log: {}", report.audit_log);
    if report.master_written {
        eprintln!(
            "master written: {} ({} -> {} rows)",
            report.master, report.master_rows_before, report.master_rows_after
        );
    } else if report.dry_run {
        eprintln!("dry-run: master not written");
    }
    if let Some(p) = &report.publish {
        eprintln!(
            "published {}:{}/{} (commit {})",
            p.repo,
            p.branch,
            p.path,
            p.commit_sha.as_deref().unwrap_or("unknown")
        );
    }
}
