mod aggregator;
mod cli;
mod columns;
mod error;
mod exporter;
mod filter;
mod fmt;
mod kana;
mod loader;
mod models;
mod normalizer;
mod session;
mod settings;
mod tui;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    // RUST_LOG=info shows per-stage row counts on stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file } => cli::run::run(&file),
        Commands::Summarize {
            file,
            filters,
            exclude_customer,
            skip_numeric_customers,
            output,
            dir,
        } => cli::summarize::run(
            &file,
            &filters,
            &exclude_customer,
            skip_numeric_customers,
            output.as_deref(),
            dir.as_deref(),
        ),
        Commands::Customers { file, filters } => cli::customers::run(&file, &filters),
        Commands::Preview {
            file,
            filters,
            limit,
        } => cli::preview::run(&file, &filters, limit),
        Commands::Config {
            export_dir,
            preview_rows,
        } => cli::config::run(export_dir, preview_rows),
    };

    if let Err(e) = result {
        if e.is_warning() {
            eprintln!("{} {e}", "Warning:".yellow().bold());
            return;
        }
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
