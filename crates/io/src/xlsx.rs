// Excel import (xlsx, xls, xlsb, ods) via calamine, export via rust_xlsxwriter

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use seriesmaster_recon::{CellValue, Table};

use crate::IoError;

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    let workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Read one named sheet.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;
    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(IoError::SheetNotFound {
            path: path.display().to_string(),
            sheet: sheet.to_string(),
        });
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| IoError::read(path, format!("sheet '{sheet}': {e}")))?;
    Ok(range_to_table(&range))
}

/// Read the first sheet. Returns the table and the sheet's name.
pub fn read_first_sheet(path: &Path) -> Result<(Table, String), IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::read(path, "workbook contains no sheets"))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| IoError::read(path, format!("sheet '{first}': {e}")))?;
    Ok((range_to_table(&range), first))
}

/// First row of the used range is the header; later rows are data.
fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let header = match rows.next() {
        Some(h) => h,
        None => return Table::default(),
    };

    let columns = header
        .iter()
        .enumerate()
        .map(|(i, c)| match convert(c) {
            CellValue::Empty => format!("Unnamed: {i}"),
            v => v.to_string(),
        })
        .collect();
    let mut table = Table::new(columns);

    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(convert).collect();
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push_row(cells);
    }
    table
}

fn convert(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::text(format!("#{e:?}")),
        Data::DateTime(dt) if dt.is_datetime() => CellValue::DateTime(dt.as_f64()),
        // Durations stay numeric
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::text(s.as_str()),
        Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

pub fn is_writable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "xlsx" | "xlsm"))
        .unwrap_or(false)
}

/// Write `table` as the only sheet of a new workbook.
pub fn write_table(table: &Table, path: &Path, sheet: &str) -> Result<(), IoError> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet)
        .map_err(|e| IoError::write(path, format!("sheet '{sheet}': {e}")))?;
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .map_err(|e| IoError::write(path, e))?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let xr = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let xc = c as u16;
            let written = match cell {
                CellValue::Empty => continue,
                CellValue::Text(s) => worksheet.write_string(xr, xc, s),
                CellValue::Number(n) => worksheet.write_number(xr, xc, *n),
                CellValue::Boolean(b) => worksheet.write_boolean(xr, xc, *b),
                CellValue::DateTime(serial) => {
                    let format = if serial.fract() == 0.0 { &date_format } else { &datetime_format };
                    worksheet.write_number_with_format(xr, xc, *serial, format)
                }
            };
            written.map_err(|e| IoError::write(path, e))?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| IoError::write(path, format!("failed to save XLSX file: {e}")))?;
    Ok(())
}
