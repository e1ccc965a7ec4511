//! Crossover trading agent CLI.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use crossover_config::load_config;
use crossover_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.format == "json";
    let _guard = setup_logging(&level, json, config.logging.file.as_deref().map(Path::new));

    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, &config).await,
        Commands::Scan(args) => cli::commands::scan::run(args, &config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config, &config),
    }
}
