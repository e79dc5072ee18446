use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path};

pub fn run(export_dir: Option<String>, preview_rows: Option<usize>) -> Result<()> {
    let mut settings = load_settings();
    let changed = export_dir.is_some() || preview_rows.is_some();
    if let Some(dir) = export_dir {
        settings.export_dir = dir;
    }
    if let Some(rows) = preview_rows {
        settings.preview_rows = rows;
    }
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    println!("Export dir:    {}", settings.export_dir);
    println!("Preview rows:  {}", settings.preview_rows);
    Ok(())
}
