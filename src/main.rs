//! Iatrikos Analyze - run one clinical case analysis from the command line
//!
//! Usage:
//!   iatrikos-analyze <case.json> [--config <path>] [--output <file>]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use iatrikos_analysis::storage::ConfigService;
use iatrikos_analysis::{init_tracing, AppState, Case};

#[derive(Parser)]
#[command(name = "iatrikos-analyze")]
#[command(version)]
#[command(about = "Analyze a clinical case and print the compiled record", long_about = None)]
struct Cli {
    /// Case file (JSON)
    case: PathBuf,

    /// Configuration file (defaults to ~/.iatrikos/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the record here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full run report instead of only the record
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::open(path),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;

    let content = fs::read_to_string(&cli.case)
        .with_context(|| format!("failed to read case file {}", cli.case.display()))?;
    let case: Case = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse case file {}", cli.case.display()))?;

    let state = AppState::from_settings(config_service.resolved_config())
        .context("failed to initialize analysis services")?;
    let report = state.engine().run(&case).await;

    tracing::info!(
        case_id = %case.case_id,
        final_state = %report.final_state,
        diagnoses = report.record.diagnoses.len(),
        "analysis finished"
    );

    let rendered = if cli.report {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.record)?
    };

    match cli.output {
        Some(path) => fs::write(&path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", rendered),
    }

    Ok(())
}
