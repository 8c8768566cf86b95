//! `smaster preview`: first rows of the master.

use std::path::PathBuf;

use serde::Serialize;

use seriesmaster_config::Settings;
use seriesmaster_io::{load_master, MasterStatus};

use crate::util::render_table;
use crate::CliError;

const MAX_COLUMN_WIDTH: usize = 32;

#[derive(Serialize)]
struct PreviewJson {
    master: String,
    sheet: String,
    total_rows: usize,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

pub fn cmd_preview(
    master: Option<PathBuf>,
    sheet: Option<String>,
    rows: usize,
    json: bool,
    settings: &Settings,
) -> Result<(), CliError> {
    let path = master.unwrap_or_else(|| settings.master.path.clone());
    let mut sheet = sheet.unwrap_or_else(|| settings.master.sheet.clone());
    let loaded = load_master(&path, &sheet, &settings.schema).map_err(CliError::io)?;
    if let MasterStatus::SheetFallback(first) = &loaded.status {
        sheet = first.clone();
    }

    let head = loaded.table.head(rows);
    let cells: Vec<Vec<String>> = head
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    if json {
        let out = PreviewJson {
            master: path.display().to_string(),
            sheet,
            total_rows: loaded.table.len(),
            columns: head.columns.clone(),
            rows: cells,
        };
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    match loaded.status {
        MasterStatus::Missing => eprintln!("{} does not exist yet", path.display()),
        MasterStatus::NoSheets => eprintln!("{} has no sheets", path.display()),
        _ => {}
    }
    print!("{}", render_table(&head.columns, &cells, MAX_COLUMN_WIDTH));
    eprintln!("{} of {} row(s)", head.len(), loaded.table.len());
    Ok(())
}
