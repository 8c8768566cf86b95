use std::fmt;

use chrono::Timelike;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Cells + tables
// ---------------------------------------------------------------------------

/// A single cell as read from a spreadsheet or CSV.
///
/// Passthrough columns keep their original type through a run; only the key
/// columns and the value column are rewritten as normalized text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Spreadsheet date or date-time as an Excel serial (days since 1899-12-30).
    DateTime(f64),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Parse as a number, accepting numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
            // Integers without decimals
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(true) => write!(f, "True"),
            Self::Boolean(false) => write!(f, "False"),
            Self::DateTime(serial) => match excel_serial_to_datetime(*serial) {
                Some(dt) if dt.time().num_seconds_from_midnight() == 0 => write!(f, "{}", dt.format("%Y-%m-%d")),
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{serial}"),
            },
        }
    }
}

/// Excel serial to a calendar date-time, rounded to the second.
pub fn excel_serial_to_datetime(serial: f64) -> Option<chrono::NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(chrono::Duration::try_seconds(seconds)?)
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// An ordered record set with named columns.
///
/// Rows are positional against `columns`. Short rows are treated as padded
/// with `Empty`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn with_columns(columns: &[&str]) -> Self {
        Self::new(columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY_CELL)
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= col {
                r.resize(col + 1, CellValue::Empty);
            }
            r[col] = value;
        }
    }

    /// Cell by column name, `Empty` when the column is absent.
    pub fn get(&self, row: usize, column: &str) -> &CellValue {
        match self.column_index(column) {
            Some(col) => self.cell(row, col),
            None => &EMPTY_CELL,
        }
    }

    /// Add `name` as an all-empty column if absent. Returns its index.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, CellValue::Empty);
        }
        width - 1
    }

    /// Rewrite one column in place.
    pub fn map_column(&mut self, col: usize, f: impl Fn(&CellValue) -> CellValue) {
        for row in &mut self.rows {
            if row.len() <= col {
                row.resize(col + 1, CellValue::Empty);
            }
            row[col] = f(&row[col]);
        }
    }

    /// First `n` rows, same columns.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One normalized reconciliation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// Trimmed key values, in key-column order. May contain blanks.
    pub key: Vec<String>,
    pub requested: String,
    pub is_delete: bool,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RejectFile,
    SkipRow,
    NoMatch,
    Delete,
    Update,
    NoChange,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RejectFile => "reject_file",
            Self::SkipRow => "skip_row",
            Self::NoMatch => "no_match",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::NoChange => "no_change",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decision of a run. Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub action: AuditAction,
    pub key: String,
    pub old_value: String,
    pub new_value: String,
    pub comment: String,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Counters of a run. `updates` and `deletions` count physical master
/// records, so a key shared by N records adds N.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconCounts {
    pub updates: usize,
    pub deletions: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ReconOutcome {
    /// Master after updates and deferred deletions. An unmodified copy of
    /// the input master when `rejected`.
    pub master: Table,
    pub audit: Vec<AuditEntry>,
    pub counts: ReconCounts,
    pub rejected: bool,
    /// Required columns missing from the input. Empty when the batch was
    /// rejected for an invalid schema.
    pub missing_columns: Vec<String>,
    /// Input rows that reached a terminal classification.
    pub rows_processed: usize,
}

impl ReconOutcome {
    /// Entries per action, in first-seen order.
    pub fn action_counts(&self) -> Vec<(AuditAction, usize)> {
        let mut counts: Vec<(AuditAction, usize)> = Vec::new();
        for entry in &self.audit {
            match counts.iter_mut().find(|(a, _)| *a == entry.action) {
                Some((_, n)) => *n += 1,
                None => counts.push((entry.action, 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(12345.0).to_string(), "12345");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "True");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn datetime_display() {
        assert_eq!(CellValue::DateTime(45730.0).to_string(), "2025-03-14");
        assert_eq!(CellValue::DateTime(45730.5).to_string(), "2025-03-14 12:00:00");
        assert_eq!(CellValue::DateTime(f64::NAN).to_string(), "NaN");
        // Dates are not counts
        assert_eq!(CellValue::DateTime(45730.0).as_f64(), None);
    }

    #[test]
    fn ensure_column_pads_existing_rows() {
        let mut t = Table::with_columns(&["a"]);
        t.push_row(vec!["1".into()]);
        let idx = t.ensure_column("b");
        assert_eq!(idx, 1);
        assert_eq!(t.rows[0].len(), 2);
        assert!(t.cell(0, 1).is_empty());
        // Existing column is not duplicated
        assert_eq!(t.ensure_column("a"), 0);
        assert_eq!(t.columns.len(), 2);
    }

    #[test]
    fn push_row_pads_short_rows() {
        let mut t = Table::with_columns(&["a", "b", "c"]);
        t.push_row(vec!["x".into()]);
        assert_eq!(t.rows[0].len(), 3);
        assert_eq!(t.get(0, "a"), &CellValue::text("x"));
        assert!(t.get(0, "missing").is_empty());
    }

    #[test]
    fn audit_action_names() {
        assert_eq!(AuditAction::RejectFile.to_string(), "reject_file");
        assert_eq!(AuditAction::NoChange.as_str(), "no_change");
        let json = serde_json::to_string(&AuditAction::SkipRow).unwrap();
        assert_eq!(json, "\"skip_row\"");
    }
}
