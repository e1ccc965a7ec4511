//! Single evaluation pass.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{error, info};

use crossover_broker::PaperBroker;
use crossover_config::AppConfig;
use crossover_core::traits::{Broker, MarketData};
use crossover_core::types::PassStatus;
use crossover_data::CsvTradeLog;
use crossover_engine::{Orchestrator, PassOutcome};
use crossover_monitor::{HtmlReportPublisher, LogSummaryPublisher};
use crossover_strategy::GoldenCrossStrategy;

use super::{alpaca, csv_source};
use crate::cli::RunArgs;

type Collaborators = (Arc<dyn Broker>, Arc<dyn MarketData>);

pub async fn run(args: RunArgs, config: &AppConfig) -> Result<ExitCode> {
    let (broker, market_data) = match &args.paper_data {
        Some(dir) => paper(dir, args.capital, config)?,
        None => {
            let alpaca = alpaca(config)?;
            info!(paper = config.alpaca.paper, "Using Alpaca");
            let broker: Arc<dyn Broker> = alpaca.clone();
            let data: Arc<dyn MarketData> = alpaca;
            (broker, data)
        }
    };

    let outcome = orchestrator(config, broker, market_data)?.run_pass().await;
    Ok(exit_code(&outcome))
}

/// Paper broker filling from the CSV files in `dir`.
fn paper(dir: &Path, capital: Decimal, config: &AppConfig) -> Result<Collaborators> {
    info!(dir = %dir.display(), capital = %capital, "Using paper broker");
    let paper = Arc::new(
        PaperBroker::new(capital, Arc::new(csv_source(dir)?))
            .with_history_days(config.strategy.history_days),
    );
    let broker: Arc<dyn Broker> = paper.clone();
    let data: Arc<dyn MarketData> = paper;
    Ok((broker, data))
}

/// Orchestrator wired to the configured trade log and report sinks.
fn orchestrator(
    config: &AppConfig,
    broker: Arc<dyn Broker>,
    market_data: Arc<dyn MarketData>,
) -> Result<Orchestrator> {
    let strategy = GoldenCrossStrategy::new(config.strategy.golden_cross())
        .context("Invalid strategy parameters")?;
    let limits = config.strategy.limits()?;

    let mut orchestrator = Orchestrator::new(
        strategy,
        limits,
        config.watchlist.symbols.clone(),
        broker,
        market_data,
    )
    .with_history_days(config.strategy.history_days)
    .with_recorder(Arc::new(CsvTradeLog::new(&config.output.trade_log)))
    .with_publisher(Arc::new(LogSummaryPublisher));

    if config.output.html_reports {
        orchestrator =
            orchestrator.with_publisher(Arc::new(HtmlReportPublisher::new(&config.output.reports_dir)));
    }
    Ok(orchestrator)
}

/// Closed market and completed passes succeed; an aborted pass fails.
fn exit_code(outcome: &PassOutcome) -> ExitCode {
    match outcome {
        PassOutcome::MarketClosed => {
            info!("Market is closed; nothing to do");
            ExitCode::SUCCESS
        }
        PassOutcome::Completed(summary) => {
            info!(
                trades = summary.intents.len(),
                failures = summary.failures.len(),
                "Pass completed"
            );
            ExitCode::SUCCESS
        }
        PassOutcome::Aborted(summary) => {
            if let PassStatus::Aborted { reason } = &summary.status {
                error!(reason = %reason, "Pass aborted");
            }
            ExitCode::FAILURE
        }
    }
}
