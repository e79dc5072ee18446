use std::path::PathBuf;

use colored::Colorize;

use crate::cli::text::format_summary;
use crate::cli::{filtered_session, FilterArgs};
use crate::error::Result;
use crate::exporter::read_summary;
use crate::settings::{get_export_dir, shellexpand_path};

pub fn run(
    file: &str,
    filters: &FilterArgs,
    exclude_customer: &[String],
    skip_numeric_customers: bool,
    output: Option<&str>,
    dir: Option<&str>,
) -> Result<()> {
    let mut session = filtered_session(file, filters)?;
    session.proceed()?;

    let selection = session.selection_mut();
    if skip_numeric_customers {
        selection.deselect_numeric_leading();
    }
    for name in exclude_customer {
        if !selection.options().contains(name) {
            eprintln!("{} no customer named {name} after filtering", "note:".dimmed());
        }
        selection.set(name, false);
    }

    let summary = session.summary()?;
    println!("{}", format_summary(&summary));

    if let Some(name) = output {
        session.confirm_filename(name)?;
    }
    let dir = dir
        .map(|d| PathBuf::from(shellexpand_path(d)))
        .unwrap_or_else(get_export_dir);
    let path = session.export(&dir)?;
    let written = read_summary(&path)?;
    println!("Wrote {} ({} rows)", path.display(), written.len());
    Ok(())
}
