// Table file I/O: CSV/TSV, Excel, master workbook, audit files

pub mod audit_file;
pub mod csv;
pub mod master;
pub mod xlsx;

use std::fmt;
use std::path::Path;

use seriesmaster_recon::Table;

pub use audit_file::write_audit_log;
pub use master::{load_master, save_master, LoadedMaster, MasterStatus};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum IoError {
    /// The file exists but could not be opened or parsed.
    Read { path: String, message: String },
    /// The file could not be produced.
    Write { path: String, message: String },
    /// Extension not recognized for this operation.
    UnsupportedFormat(String),
    /// A named sheet is absent and no fallback applies.
    SheetNotFound { path: String, sheet: String },
}

impl IoError {
    pub(crate) fn read(path: &Path, message: impl fmt::Display) -> Self {
        Self::Read { path: path.display().to_string(), message: message.to_string() }
    }

    pub(crate) fn write(path: &Path, message: impl fmt::Display) -> Self {
        Self::Write { path: path.display().to_string(), message: message.to_string() }
    }

    /// True for failures that happened while reading.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::SheetNotFound { .. })
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Write { path, message } => write!(f, "cannot write {path}: {message}"),
            Self::UnsupportedFormat(path) => write!(f, "unsupported file format: {path}"),
            Self::SheetNotFound { path, sheet } => write!(f, "{path}: sheet '{sheet}' not found"),
        }
    }
}

impl std::error::Error for IoError {}

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    /// xlsx, xlsm, xls, xlsb, ods. Only xlsx/xlsm are writable.
    Excel,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Read a table from a CSV/TSV or spreadsheet file. For spreadsheets the
/// first sheet is used.
pub fn read_table(path: &Path) -> Result<Table, IoError> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Csv) => csv::read_table(path, None),
        Some(TableFormat::Tsv) => csv::read_table(path, Some(b'\t')),
        Some(TableFormat::Excel) => xlsx::read_first_sheet(path).map(|(t, _)| t),
        None => Err(IoError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Write a table, choosing the format from the extension. `sheet` names the
/// worksheet for Excel output.
pub fn write_table(table: &Table, path: &Path, sheet: &str) -> Result<(), IoError> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Csv) => csv::write_table(table, path, b','),
        Some(TableFormat::Tsv) => csv::write_table(table, path, b'\t'),
        Some(TableFormat::Excel) if xlsx::is_writable(path) => xlsx::write_table(table, path, sheet),
        _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
    }
}
