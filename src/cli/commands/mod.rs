//! CLI command implementations.

pub mod run;
pub mod scan;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossover_broker::{AlpacaBroker, AlpacaConfig};
use crossover_config::AppConfig;
use crossover_core::traits::MarketData;
use crossover_data::CsvPriceSource;

/// Alpaca client built from the configured credential variables.
pub fn alpaca(config: &AppConfig) -> Result<Arc<AlpacaBroker>> {
    let settings = &config.alpaca;
    let mut alpaca = AlpacaConfig::from_env_vars(
        &settings.api_key_env,
        &settings.api_secret_env,
        settings.paper,
    )
    .context("Alpaca credentials are required")?;

    if let Some(url) = &settings.base_url {
        alpaca = alpaca.with_base_url(url);
    }
    if let Some(url) = &settings.data_url {
        alpaca = alpaca.with_data_url(url);
    }
    if let Some(feed) = &settings.feed {
        alpaca = alpaca.with_feed(feed);
    }

    Ok(Arc::new(AlpacaBroker::new(alpaca)?))
}

/// CSV directory when given, Alpaca otherwise.
pub fn market_data(config: &AppConfig, csv_dir: Option<&Path>) -> Result<Arc<dyn MarketData>> {
    let source: Arc<dyn MarketData> = match csv_dir {
        Some(dir) => Arc::new(csv_source(dir)?),
        None => alpaca(config)?,
    };
    Ok(source)
}

pub fn csv_source(dir: &Path) -> Result<CsvPriceSource> {
    CsvPriceSource::new(dir).with_context(|| format!("Cannot read price data from {}", dir.display()))
}
