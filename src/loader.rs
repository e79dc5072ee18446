use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::columns;
use crate::error::{OroshiError, Result};
use crate::models::{Cell, RawTable};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a number from spreadsheet text: "1,200", " 30000 ", "(500)", "¥980".
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('¥', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        -inner.trim().parse::<f64>().ok()?
    } else {
        s.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

/// Parse a calendar date from text. Accepts YYYY-MM-DD, YYYY/MM/DD and YYYYMMDD,
/// optionally followed by a time of day which is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let (date_part, time_part) = match raw.find(&[' ', 'T'][..]) {
        Some(i) => (&raw[..i], raw[i + 1..].trim()),
        None => (raw, ""),
    };
    if !time_part.is_empty()
        && NaiveTime::parse_from_str(time_part, "%H:%M:%S").is_err()
        && NaiveTime::parse_from_str(time_part, "%H:%M:%S%.f").is_err()
        && NaiveTime::parse_from_str(time_part, "%H:%M").is_err()
    {
        return None;
    }
    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(date_part, "%Y%m%d").ok();
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y/%m/%d"))
        .ok()
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

/// Interpret any cell as a calendar date; unparseable values are None.
pub fn cell_to_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(serial) | Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Text(s) => parse_date(s),
        _ => None,
    }
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> OroshiError {
    OroshiError::Load(format!("{}: {e}", path.display()))
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

// ---------------------------------------------------------------------------
// load_file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Csv,
    Workbook,
}

impl SourceKind {
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

pub struct LoadedFile {
    pub table: RawTable,
    pub checksum: String,
}

pub fn load_file(path: &Path) -> Result<LoadedFile> {
    let kind = SourceKind::detect(path)
        .ok_or_else(|| load_error(path, "unsupported file type (expected .xlsx, .xls or .csv)"))?;
    let data = std::fs::read(path).map_err(|e| load_error(path, e))?;
    let checksum = compute_checksum(&data);

    let table = match kind {
        SourceKind::Csv => parse_csv(&data).map_err(|e| load_error(path, e))?,
        SourceKind::Workbook => parse_workbook(path)?,
    };
    info!(
        file = %path.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "loaded spreadsheet"
    );
    Ok(LoadedFile { table, checksum })
}

/// Names of required columns absent from the table, in required-set order.
pub fn missing_columns(table: &RawTable) -> Vec<String> {
    columns::REQUIRED
        .iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect()
}

pub fn validate_columns(table: &RawTable) -> Result<()> {
    let missing = missing_columns(table);
    if missing.is_empty() {
        Ok(())
    } else {
        debug!(?missing, "schema check failed");
        Err(OroshiError::Schema { missing })
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn parse_csv(data: &[u8]) -> std::result::Result<RawTable, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);
    let columns: Vec<String> = rdr.headers()?.iter().map(clean_header).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: Vec<Cell> = record
            .iter()
            .map(|f| {
                if f.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(f.to_string())
                }
            })
            .collect();
        if row.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        rows.push(row);
    }
    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// Workbooks (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "excel")]
fn parse_workbook(path: &Path) -> Result<RawTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| load_error(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| load_error(path, "workbook has no worksheets"))?
        .map_err(|e| load_error(path, e))?;

    let mut iter = range.rows();
    let columns: Vec<String> = match iter.next() {
        Some(header) => header.iter().map(|c| clean_header(&c.to_string())).collect(),
        None => return Err(load_error(path, "worksheet is empty")),
    };

    let mut rows = Vec::new();
    for row in iter {
        let cells: Vec<Cell> = row
            .iter()
            .map(|c| match c {
                Data::Empty | Data::Error(_) => Cell::Empty,
                Data::String(s) if s.is_empty() => Cell::Empty,
                Data::String(s) => Cell::Text(s.clone()),
                Data::Float(f) => Cell::Number(*f),
                Data::Int(i) => Cell::Number(*i as f64),
                Data::Bool(b) => Cell::Bool(*b),
                Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
                Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            })
            .collect();
        if cells.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        rows.push(cells);
    }
    Ok(RawTable { columns, rows })
}

#[cfg(not(feature = "excel"))]
fn parse_workbook(path: &Path) -> Result<RawTable> {
    Err(load_error(path, "built without spreadsheet support; convert to .csv"))
}
