//! Series comparison: rank master series names that contain each requested
//! series by their share of usage.

use crate::error::ReconError;
use crate::model::{CellValue, Table};
use crate::normalize::normalize_str;

pub const SERIES_NAME_COLUMN: &str = "SeriesName";
pub const USAGE_COUNT_COLUMN: &str = "UsageCount";
pub const USAGE_PERCENT_COLUMN: &str = "UsagePercent";
pub const MIN_USAGE_COLUMN: &str = "MinUsagePercent";

/// Match every distinct requested series against `SeriesName` in `master`.
///
/// Matching is a case-insensitive substring test. Matches of one request are
/// ranked by `UsagePercent` (share of their combined `UsageCount`) and cut to
/// `top_n`. A request with no match yields a single row with a blank series
/// and 0 percent. When `rules` carries `MinUsagePercent`, rows below its
/// largest value are dropped.
///
/// Output columns: `requested_column`, then the master columns, then
/// `UsagePercent`.
pub fn match_series(
    comparison: &Table,
    requested_column: &str,
    master: &Table,
    rules: Option<&Table>,
    top_n: usize,
) -> Result<Table, ReconError> {
    let req_col = require(comparison, "comparison", requested_column)?;
    let name_col = require(master, "master", SERIES_NAME_COLUMN)?;
    let count_col = require(master, "master", USAGE_COUNT_COLUMN)?;

    let passthrough: Vec<usize> = (0..master.columns.len())
        .filter(|&c| master.columns[c] != requested_column && master.columns[c] != USAGE_PERCENT_COLUMN)
        .collect();
    let mut columns = vec![requested_column.to_string()];
    columns.extend(passthrough.iter().map(|&c| master.columns[c].clone()));
    columns.push(USAGE_PERCENT_COLUMN.to_string());
    let mut out = Table::new(columns);

    let names: Vec<String> = (0..master.len())
        .map(|r| normalize_str(master.cell(r, name_col)).to_lowercase())
        .collect();

    let threshold = rules.and_then(min_usage_threshold);

    for requested in distinct_requests(comparison, req_col) {
        let needle = requested.to_lowercase();
        let hits: Vec<usize> = (0..master.len()).filter(|&r| names[r].contains(&needle)).collect();

        let mut ranked: Vec<(usize, f64)> = Vec::with_capacity(hits.len());
        let denom: f64 = hits.iter().filter_map(|&r| master.cell(r, count_col).as_f64()).sum();
        for &r in &hits {
            let pct = match master.cell(r, count_col).as_f64() {
                Some(count) if denom != 0.0 && denom.is_finite() => count / denom * 100.0,
                _ => 0.0,
            };
            ranked.push((r, pct));
        }
        // Stable, so ties keep master order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_n);

        if hits.is_empty() {
            let mut row = vec![CellValue::Empty; out.columns.len()];
            row[0] = CellValue::text(requested.as_str());
            row[out.columns.len() - 1] = CellValue::Number(0.0);
            push_filtered(&mut out, row, 0.0, threshold);
            continue;
        }

        for (r, pct) in ranked {
            let mut row = Vec::with_capacity(out.columns.len());
            row.push(CellValue::text(requested.as_str()));
            row.extend(passthrough.iter().map(|&c| master.cell(r, c).clone()));
            row.push(CellValue::Number(pct));
            push_filtered(&mut out, row, pct, threshold);
        }
    }

    log::debug!("series comparison produced {} row(s)", out.len());
    Ok(out)
}

fn require(table: &Table, name: &str, column: &str) -> Result<usize, ReconError> {
    table.column_index(column).ok_or_else(|| ReconError::MissingColumn {
        table: name.into(),
        column: column.into(),
    })
}

/// Non-blank requested values in first-seen order, without repeats.
fn distinct_requests(table: &Table, col: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for r in 0..table.len() {
        let v = normalize_str(table.cell(r, col));
        if !v.is_empty() && !seen.contains(&v) {
            seen.push(v);
        }
    }
    seen
}

/// Largest numeric `MinUsagePercent` in the rules table, if any.
fn min_usage_threshold(rules: &Table) -> Option<f64> {
    let col = rules.column_index(MIN_USAGE_COLUMN)?;
    (0..rules.len())
        .filter_map(|r| rules.cell(r, col).as_f64())
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

fn push_filtered(out: &mut Table, row: Vec<CellValue>, pct: f64, threshold: Option<f64>) {
    if threshold.map_or(true, |min| pct >= min) {
        out.push_row(row);
    }
}
