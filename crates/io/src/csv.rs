// CSV/TSV tables

use std::io::Read;
use std::path::Path;

use seriesmaster_recon::{CellValue, Table};

use crate::IoError;

/// Read a delimited file. The first record is the header row. With no
/// explicit delimiter one is sniffed from the content.
pub fn read_table(path: &Path, delimiter: Option<u8>) -> Result<Table, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    parse_table(&content, delimiter).map_err(|e| IoError::read(path, e))
}

/// Parse delimited text. Every field is read as text; empty fields are `Empty`.
pub fn parse_table(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(r) => r.map_err(|e| e.to_string())?,
        None => return Ok(Table::default()),
    };
    let mut table = Table::new(header.iter().map(|h| h.to_string()).collect());

    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        // Blank lines carry no data
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(CellValue::from).collect());
    }

    Ok(table)
}

const DELIMITER_CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |r| r.len())
}

/// Pick the delimiter whose field count over the first ten lines agrees
/// best with the header line. Candidates giving a single-field header are
/// ignored; comma is the fallback.
pub fn sniff_delimiter(content: &str) -> u8 {
    let lines: Vec<&str> = content.lines().take(10).collect();
    let Some(header) = lines.first() else {
        return b',';
    };

    let mut best = (b',', 0usize);
    for delim in DELIMITER_CANDIDATES {
        let width = field_count(header, delim);
        if width <= 1 {
            continue;
        }
        let agreeing = lines.iter().filter(|l| field_count(l, delim) == width).count();
        let score = agreeing * width;
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback). A
/// leading byte-order mark is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::read(path, e))?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Write header plus rows. Cells are rendered with their display form.
pub fn write_table(table: &Table, path: &Path, delimiter: u8) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| IoError::write(path, e))?;

    writer.write_record(&table.columns).map_err(|e| IoError::write(path, e))?;
    for row in &table.rows {
        let record: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writer.write_record(&record).map_err(|e| IoError::write(path, e))?;
    }

    writer.flush().map_err(|e| IoError::write(path, e))?;
    Ok(())
}
