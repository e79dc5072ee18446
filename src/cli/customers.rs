use crate::cli::text::format_customers;
use crate::cli::{filtered_session, FilterArgs};
use crate::error::Result;

pub fn run(file: &str, filters: &FilterArgs) -> Result<()> {
    let session = filtered_session(file, filters)?;
    print!("{}", format_customers(session.selection().options()));
    Ok(())
}
