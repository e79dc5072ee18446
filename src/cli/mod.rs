pub mod config;
pub mod customers;
pub mod preview;
pub mod run;
pub mod summarize;
pub mod text;

use std::path::Path;

use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::filter::FilterOptions;
use crate::session::Session;

/// Upload `file` into a fresh session and apply the filter flags.
pub(crate) fn filtered_session(file: &str, filters: &FilterArgs) -> Result<Session> {
    let mut session = Session::new(chrono::Local::now().naive_local());
    let report = session.upload(Path::new(file))?;
    eprintln!("{}", text::format_load_report(report));
    session.apply_filter(filters.options())?;
    Ok(session)
}

#[derive(Parser)]
#[command(
    name = "oroshi",
    about = "Turn a wholesale sales spreadsheet into a monthly per-customer summary."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Products starting with "Nintendo Switch" or "NS"
    #[arg(long)]
    pub switch: bool,
    /// Products not starting with "Nintendo Switch" or "NS"
    #[arg(long = "not-switch")]
    pub not_switch: bool,
    /// Products starting with トミカ
    #[arg(long)]
    pub tomica: bool,
    /// Products starting with PMカード
    #[arg(long = "pokemon-card")]
    pub pokemon_card: bool,
    /// Products containing ガンダム
    #[arg(long)]
    pub gundam: bool,
    /// Regular expression searched for in product names
    #[arg(long)]
    pub keyword: Option<String>,
}

impl FilterArgs {
    pub fn options(&self) -> FilterOptions {
        FilterOptions {
            switch: self.switch,
            not_switch: self.not_switch,
            tomica: self.tomica,
            pokemon_card: self.pokemon_card,
            gundam: self.gundam,
            keyword: self.keyword.clone().unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open an interactive session on a spreadsheet.
    Run {
        /// Path to the .xlsx/.xls/.csv sales file
        file: String,
    },
    /// Filter, aggregate and export in one go.
    Summarize {
        /// Path to the .xlsx/.xls/.csv sales file
        file: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Customer name to leave out (repeatable)
        #[arg(long = "exclude-customer")]
        exclude_customer: Vec<String>,
        /// Leave out customers whose name starts with a digit
        #[arg(long = "skip-numeric-customers")]
        skip_numeric_customers: bool,
        /// Output file name (default: 集計結果_YYYYMMDD_HHMM.csv)
        #[arg(long)]
        output: Option<String>,
        /// Output directory (default: configured export directory)
        #[arg(long)]
        dir: Option<String>,
    },
    /// List the customers left after filtering.
    Customers {
        file: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show the rows left after filtering.
    Preview {
        file: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Maximum rows to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show or change settings.
    Config {
        /// Default directory for exported summaries
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
        /// Rows shown in the interactive preview
        #[arg(long = "preview-rows")]
        preview_rows: Option<usize>,
    },
}
