use crate::cli::text::format_preview;
use crate::cli::{filtered_session, FilterArgs};
use crate::error::Result;

pub fn run(file: &str, filters: &FilterArgs, limit: usize) -> Result<()> {
    let session = filtered_session(file, filters)?;
    let rows = session.filtered().unwrap_or_default();
    println!("{} rows after filtering", rows.len());
    println!("{}", format_preview(rows, limit));
    Ok(())
}
