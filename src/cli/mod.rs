//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crossover-agent")]
#[command(author, version, about = "Golden-cross / death-cross equity trading agent")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one evaluation pass
    Run(RunArgs),
    /// Report recent golden crosses across the watchlist
    Scan(ScanArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Trade against an in-memory paper broker fed from <SYMBOL>.csv files
    #[arg(long)]
    pub paper_data: Option<PathBuf>,

    /// Starting cash for the paper broker
    #[arg(long, default_value = "100000")]
    pub capital: Decimal,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct ScanArgs {
    /// Trading days to look back (defaults to the configured lookback)
    #[arg(long)]
    pub lookback: Option<usize>,

    /// Read <SYMBOL>.csv files from this directory instead of Alpaca
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Symbols to scan instead of the watchlist (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Also report death crosses
    #[arg(long)]
    pub include_death: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}
