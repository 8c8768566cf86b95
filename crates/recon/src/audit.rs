//! Append-only audit trail of a run and its persisted CSV form.
//!
//! The CSV layout (`timestamp,action,key,old_value,new_value,comment`) is read
//! by existing tooling; do not reorder or rename columns.

use std::io::Write;

use crate::error::ReconError;
use crate::model::{AuditAction, AuditEntry};

pub const AUDIT_COLUMNS: [&str; 6] = ["timestamp", "action", "key", "old_value", "new_value", "comment"];

/// Local wall-clock time, ISO 8601 to the second.
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Ordered decisions of one run. Entries are never removed or reordered.
#[derive(Debug, Clone)]
pub struct AuditLog {
    timestamp: String,
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    /// All entries of the log share `timestamp`.
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self { timestamp: timestamp.into(), entries: Vec::new() }
    }

    pub fn record(
        &mut self,
        action: AuditAction,
        key: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        comment: impl Into<String>,
    ) {
        self.entries.push(AuditEntry {
            timestamp: self.timestamp.clone(),
            action,
            key: key.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            comment: comment.into(),
        });
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }
}

/// Serialize entries as CSV. The header row is written even for an empty log.
pub fn write_csv<W: Write>(entries: &[AuditEntry], writer: W) -> Result<(), ReconError> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(AUDIT_COLUMNS).map_err(|e| ReconError::Io(e.to_string()))?;
    for entry in entries {
        w.serialize(entry).map_err(|e| ReconError::Io(e.to_string()))?;
    }
    w.flush().map_err(|e| ReconError::Io(e.to_string()))?;
    Ok(())
}

/// Bracketed, quoted list rendering used in rejection comments: `['A', 'B']`.
pub(crate) fn format_column_list(columns: &[String]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
    format!("[{}]", quoted.join(", "))
}
