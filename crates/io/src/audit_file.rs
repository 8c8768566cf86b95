// Audit log files

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use seriesmaster_recon::{audit, AuditEntry};

use crate::IoError;

/// `update_log_YYYYMMDD_HHMMSS.csv`
pub fn audit_file_name(at: &NaiveDateTime) -> String {
    format!("update_log_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Write `entries` into a new timestamped file under `dir`, creating `dir`
/// if needed. An existing file of the same name is never overwritten; a
/// numeric suffix is added instead.
pub fn write_audit_log(dir: &Path, entries: &[AuditEntry]) -> Result<PathBuf, IoError> {
    write_audit_log_at(dir, entries, &Local::now().naive_local())
}

pub fn write_audit_log_at(dir: &Path, entries: &[AuditEntry], at: &NaiveDateTime) -> Result<PathBuf, IoError> {
    std::fs::create_dir_all(dir).map_err(|e| IoError::write(dir, e))?;

    let base = audit_file_name(at);
    let mut path = dir.join(&base);
    let mut n = 1;
    while path.exists() {
        let stem = base.trim_end_matches(".csv");
        path = dir.join(format!("{stem}_{n}.csv"));
        n += 1;
    }

    let file = File::create(&path).map_err(|e| IoError::write(&path, e))?;
    audit::write_csv(entries, file).map_err(|e| IoError::write(&path, e))?;
    log::info!("audit log written to {} ({} entries)", path.display(), entries.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use seriesmaster_recon::{AuditAction, AuditLog};
    use tempfile::tempdir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap()
    }

    #[test]
    fn file_name_pattern() {
        assert_eq!(audit_file_name(&at()), "update_log_20260115_093005.csv");
    }

    #[test]
    fn writes_header_and_entries() {
        let dir = tempdir().unwrap();
        let mut log = AuditLog::new("2026-01-15T09:30:05");
        log.record(AuditAction::NoMatch, "V9|M|C|F", "", "S", "No matching row in master; no action taken.");

        let path = write_audit_log_at(&dir.path().join("logs"), log.entries(), &at()).unwrap();
        assert!(path.ends_with("logs/update_log_20260115_093005.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "timestamp,action,key,old_value,new_value,comment");
        assert!(lines[1].starts_with("2026-01-15T09:30:05,no_match,V9|M|C|F,,S,"));
    }

    #[test]
    fn same_second_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let first = write_audit_log_at(dir.path(), &[], &at()).unwrap();
        let second = write_audit_log_at(dir.path(), &[], &at()).unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("update_log_20260115_093005_1.csv"));
    }
}
