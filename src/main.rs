//! modelaudit - Audit CSV financial models for formula-consistency defects.

use anyhow::{Context, Result, bail};
use clap::Parser;
use modelaudit_core::{AuditSettings, Auditor, CsvWorkbook};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Classify every populated cell of a model and report hardcodes,
/// pattern breaks and errors as JSON.
#[derive(Parser, Debug)]
#[command(name = "modelaudit", version, about)]
struct Cli {
    /// CSV files or directories of CSV files; each file is one sheet
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Settings file (TOML). Defaults to audit.toml in the config dir
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Audit only these sheets (can be repeated)
    #[arg(short, long = "sheet", value_name = "NAME")]
    sheets: Vec<String>,

    /// Override the number of issues kept in the report
    #[arg(long, value_name = "N")]
    max_issues: Option<usize>,

    /// Print the report on a single line
    #[arg(long)]
    compact: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = AuditSettings::load_or_default(cli.config.as_deref())
        .context("failed to load audit settings")?;
    if let Some(max) = cli.max_issues {
        settings.max_issues = max;
    }
    tracing::info!(?settings, "settings loaded");

    let book = CsvWorkbook::from_paths(cli.paths.as_slice()).context("failed to open workbook")?;
    if book.is_empty() {
        bail!("no CSV sheets found in the given paths");
    }

    let only = (!cli.sheets.is_empty()).then_some(cli.sheets.as_slice());
    let report = Auditor::new(settings)
        .run_with_names(&book, &book, &book, only)
        .context("audit failed")?;

    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);
    Ok(())
}
