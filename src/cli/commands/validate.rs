//! Validate configuration command.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use crossover_config::AppConfig;

/// Loading already validated the file; print what will be used.
pub fn run(config_path: &Path, config: &AppConfig) -> Result<ExitCode> {
    let s = &config.strategy;

    println!("Configuration is valid: {}", config_path.display());
    println!();
    println!("App:                {} ({})", config.app.name, config.app.environment);
    println!("Log level:          {} ({})", config.logging.level, config.logging.format);
    println!("Alpaca paper mode:  {}", config.alpaca.paper);
    println!("Moving averages:    {} / {} days", s.short_window, s.long_window);
    println!("Scan lookback:      {} days", s.lookback);
    println!("Per-trade fraction: {}", s.per_trade_fraction);
    println!("Stop-loss fraction: {}", s.stop_loss_fraction);
    println!("Max positions:      {}", s.max_positions);
    println!("History requested:  {} calendar days", s.history_days);
    println!("Watchlist:          {} symbols", config.watchlist.symbols.len());
    println!("Trade log:          {}", config.output.trade_log);
    if config.output.html_reports {
        println!("HTML reports:       {}", config.output.reports_dir);
    }

    Ok(ExitCode::SUCCESS)
}
