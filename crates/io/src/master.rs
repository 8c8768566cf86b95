// Master table persistence

use std::path::Path;

use seriesmaster_recon::{Schema, Table};

use crate::{csv, xlsx, IoError, TableFormat};

/// How the master was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterStatus {
    /// The requested sheet was read.
    Loaded,
    /// The requested sheet was absent; the named first sheet was read instead.
    SheetFallback(String),
    /// No file at the path; an empty master with the schema's columns.
    Missing,
    /// The workbook has no sheets; treated like `Missing`.
    NoSheets,
}

#[derive(Debug, Clone)]
pub struct LoadedMaster {
    pub table: Table,
    pub status: MasterStatus,
}

/// Load the master from `path`.
///
/// A missing file is not an error: the result is an empty table carrying the
/// key and value columns, and so is a workbook without sheets. For workbooks,
/// a missing `sheet` falls back to the first sheet. CSV masters ignore `sheet`.
pub fn load_master(path: &Path, sheet: &str, schema: &Schema) -> Result<LoadedMaster, IoError> {
    if !path.exists() {
        log::warn!("master {} not found; starting from an empty master", path.display());
        return Ok(LoadedMaster {
            table: Table::new(schema.master_columns()),
            status: MasterStatus::Missing,
        });
    }

    let format = TableFormat::from_path(path)
        .ok_or_else(|| IoError::UnsupportedFormat(path.display().to_string()))?;

    let (table, status) = match format {
        TableFormat::Csv => (csv::read_table(path, None)?, MasterStatus::Loaded),
        TableFormat::Tsv => (csv::read_table(path, Some(b'\t'))?, MasterStatus::Loaded),
        TableFormat::Excel => match xlsx::read_sheet(path, sheet) {
            Ok(t) => (t, MasterStatus::Loaded),
            Err(IoError::SheetNotFound { .. }) => {
                if xlsx::sheet_names(path)?.is_empty() {
                    log::warn!("{} has no sheets; starting from an empty master", path.display());
                    return Ok(LoadedMaster {
                        table: Table::new(schema.master_columns()),
                        status: MasterStatus::NoSheets,
                    });
                }
                let (t, first) = xlsx::read_first_sheet(path)?;
                log::warn!(
                    "sheet '{sheet}' not found in {}; using first sheet '{first}'",
                    path.display()
                );
                (t, MasterStatus::SheetFallback(first))
            }
            Err(e) => return Err(e),
        },
    };

    log::info!("loaded master {} ({} rows)", path.display(), table.len());
    Ok(LoadedMaster { table, status })
}

/// Persist the master, creating parent directories as needed. Workbooks are
/// written with the single sheet `sheet`.
pub fn save_master(table: &Table, path: &Path, sheet: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| IoError::write(path, e))?;
        }
    }
    crate::write_table(table, path, sheet)?;
    log::info!("saved master {} ({} rows)", path.display(), table.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seriesmaster_recon::CellValue;
    use tempfile::tempdir;

    fn master() -> Table {
        let mut t = Table::new(Schema::default().master_columns());
        t.push_row(vec!["V1".into(), "M1".into(), "C1".into(), "F1".into(), "X".into()]);
        t
    }

    #[test]
    fn missing_file_gives_empty_master() {
        let dir = tempdir().unwrap();
        let loaded = load_master(&dir.path().join("none.xlsx"), "Master", &Schema::default()).unwrap();
        assert_eq!(loaded.status, MasterStatus::Missing);
        assert!(loaded.table.is_empty());
        assert_eq!(loaded.table.columns, Schema::default().master_columns());
    }

    #[test]
    fn save_creates_parents_and_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/Master.xlsx");
        save_master(&master(), &path, "Master").unwrap();

        let loaded = load_master(&path, "Master", &Schema::default()).unwrap();
        assert_eq!(loaded.status, MasterStatus::Loaded);
        assert_eq!(loaded.table.get(0, "RequestedSeries"), &CellValue::text("X"));
    }

    #[test]
    fn missing_sheet_falls_back_to_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Master.xlsx");
        save_master(&master(), &path, "Data").unwrap();

        let loaded = load_master(&path, "Master", &Schema::default()).unwrap();
        assert_eq!(loaded.status, MasterStatus::SheetFallback("Data".into()));
        assert_eq!(loaded.table.len(), 1);
    }

    #[test]
    fn csv_master_ignores_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.csv");
        save_master(&master(), &path, "ignored").unwrap();

        let loaded = load_master(&path, "Master", &Schema::default()).unwrap();
        assert_eq!(loaded.status, MasterStatus::Loaded);
        assert_eq!(loaded.table.get(0, "VariantID"), &CellValue::text("V1"));
    }

    #[test]
    fn passthrough_dates_survive_a_run() {
        use calamine::{open_workbook_auto, Data, Reader};
        use rust_xlsxwriter::{Format, Workbook};

        let dir = tempdir().unwrap();
        let path = dir.path().join("Master.xlsx");
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet().set_name("Master").unwrap();
        let date = Format::new().set_num_format("dd/mm/yyyy");
        for (c, name) in ["VariantID", "ManufacturerName", "Category", "Family", "RequestedSeries", "LastReviewed"]
            .iter()
            .enumerate()
        {
            ws.write_string(0, c as u16, *name).unwrap();
        }
        for (c, value) in ["V1", "M1", "C1", "F1", "OLD"].iter().enumerate() {
            ws.write_string(1, c as u16, *value).unwrap();
        }
        ws.write_number_with_format(1, 5, 45730.0, &date).unwrap();
        wb.save(&path).unwrap();

        let schema = Schema::default();
        let loaded = load_master(&path, "Master", &schema).unwrap();
        assert_eq!(loaded.table.get(0, "LastReviewed"), &CellValue::DateTime(45730.0));

        let mut input = Table::new(schema.required_columns());
        input.push_row(vec!["V1".into(), "M1".into(), "C1".into(), "F1".into(), "NEW".into(), "".into()]);
        let out = seriesmaster_recon::reconcile_at(&input, &loaded.table, &schema, "2026-01-15T09:30:00");
        assert_eq!(out.counts.updates, 1);
        save_master(&out.master, &path, "Master").unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range("Master").unwrap();
        match range.get_value((1, 5)) {
            Some(Data::DateTime(dt)) => assert_eq!(dt.as_f64(), 45730.0),
            other => panic!("date passthrough lost: {other:?}"),
        }
        assert_eq!(range.get_value((1, 4)), Some(&Data::String("NEW".into())));
    }

    #[test]
    fn corrupt_workbook_is_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Master.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();
        let err = load_master(&path, "Master", &Schema::default()).unwrap_err();
        assert!(err.is_read());
    }
}
