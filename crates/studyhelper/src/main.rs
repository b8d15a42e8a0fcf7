//! studyhelper - turn PDF and DOCX course material into study guides.
//!
//! Main entry point for the studyhelper CLI.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

mod app;
mod shell;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// studyhelper - turn PDF and DOCX course material into study guides
#[derive(Parser)]
#[command(name = "studyhelper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// User config directory (default: platform config dir)
    #[arg(long, value_name = "DIR", env = "STUDYHELPER_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Directory holding the memory database (default: ./memory_db)
    #[arg(long, value_name = "PATH")]
    pub memory_dir: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // API keys may live in a local .env file.
    dotenvy::dotenv().ok();

    let config_dir = cli
        .config
        .clone()
        .or_else(studyhelper_config::xdg_config_dir);
    let _guard = init_tracing(cli.verbose, config_dir.as_deref());

    let project_dir = std::env::current_dir()?;
    let loaded =
        studyhelper_config::load_config_with_options(Some(&project_dir), config_dir.as_deref())?;
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
        shell::print_warning(warning);
    }
    tracing::debug!(sources = ?loaded.loaded_from(), "Configuration loaded");

    let services = app::build(&loaded.config, cli.memory_dir.as_deref())?;
    for note in &services.notes {
        shell::print_warning(note);
    }

    let mut shell = shell::Shell::new(services.helper, services.output)?;
    shell.run().await
}

/// Console (human-readable, stderr) plus daily-rotated JSON file logging.
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing(
    verbose: bool,
    config_dir: Option<&Path>,
) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = if verbose {
        "studyhelper=debug,studyhelper_agent=debug,studyhelper_extract=debug,studyhelper_llm=debug,studyhelper_memory=debug,info"
    } else {
        "warn"
    };

    let log_dir = config_dir
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "studyhelper.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "studyhelper=trace,studyhelper_agent=trace,studyhelper_extract=trace,studyhelper_llm=trace,studyhelper_memory=trace,info",
                )),
        )
        .init();

    guard
}
