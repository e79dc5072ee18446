use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::columns;
use crate::error::{OroshiError, Result};
use crate::fmt::plain_number;
use crate::loader::parse_number;
use crate::models::{SummaryRow, YearMonth};

/// 集計結果_YYYYMMDD_HHMM.csv
pub fn default_filename(now: NaiveDateTime) -> String {
    format!("集計結果_{}.csv", now.format("%Y%m%d_%H%M"))
}

/// Trimmed `name` if it is a bare file name; directories are not allowed.
pub fn validate_filename(name: &str) -> Result<&str> {
    let name = name.trim();
    let bare = Path::new(name)
        .file_name()
        .is_some_and(|f| f == std::ffi::OsStr::new(name));
    if name.is_empty() || !bare || name.contains(&['/', '\\'][..]) {
        Err(OroshiError::InvalidFilename)
    } else {
        Ok(name)
    }
}

/// Render the summary as UTF-8 CSV with a header row.
pub fn to_csv(rows: &[SummaryRow]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(columns::SUMMARY_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.customer_code.clone(),
            row.customer_name.clone(),
            row.year_month.to_string(),
            row.unique_dates.to_string(),
            plain_number(row.quantity_total),
            plain_number(row.amount_total),
        ])?;
    }
    wtr.into_inner()
        .map_err(|e| OroshiError::Other(format!("CSV buffer error: {e}")))
}

/// Write the summary to `dir/name`, creating `dir` if needed.
pub fn write_export(dir: &Path, name: &str, rows: &[SummaryRow]) -> Result<PathBuf> {
    let name = validate_filename(name)?;
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, to_csv(rows)?)?;
    info!(path = %path.display(), rows = rows.len(), "exported summary");
    Ok(path)
}

/// Read an exported summary back.
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = rows.len() + 2;
        let field = |i: usize| record.get(i).unwrap_or("");
        let bad = |what: &str| {
            OroshiError::Other(format!("{}: bad {what} on line {line}", path.display()))
        };
        rows.push(SummaryRow {
            customer_code: field(0).to_string(),
            customer_name: field(1).to_string(),
            year_month: YearMonth::parse(field(2)).ok_or_else(|| bad("year-month"))?,
            unique_dates: field(3).parse().map_err(|_| bad("date count"))?,
            quantity_total: parse_number(field(4)).ok_or_else(|| bad("quantity"))?,
            amount_total: parse_number(field(5)).ok_or_else(|| bad("amount"))?,
        });
    }
    Ok(rows)
}
