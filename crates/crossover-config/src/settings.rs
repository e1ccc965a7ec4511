//! Configuration structures.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crossover_core::error::StrategyError;
use crossover_risk::PositionLimits;
use crossover_strategy::{default_history_days, CrossoverScanner, GoldenCrossConfig};

/// Configuration errors. Both are fatal at startup.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<StrategyError> for SettingsError {
    fn from(e: StrategyError) -> Self {
        SettingsError::Invalid(e.to_string())
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub alpaca: AlpacaSettings,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub watchlist: WatchlistSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl AppConfig {
    /// Check every parameter the agent depends on.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.strategy.validate()?;
        self.watchlist.validate()?;
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(SettingsError::Invalid(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "crossover-agent".to_string(),
            environment: "paper".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Alpaca API configuration. Credentials are named, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlpacaSettings {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Environment variable holding the API secret
    pub api_secret_env: String,
    pub paper: bool,
    /// Trading API override
    pub base_url: Option<String>,
    /// Market data API override
    pub data_url: Option<String>,
    /// Bar feed, e.g. `iex` or `sip`
    pub feed: Option<String>,
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        Self {
            api_key_env: "ALPACA_API_KEY".to_string(),
            api_secret_env: "ALPACA_SECRET_KEY".to_string(),
            paper: true,
            base_url: None,
            data_url: None,
            feed: None,
        }
    }
}

/// Strategy and risk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub short_window: usize,
    pub long_window: usize,
    /// Trading days the scanner looks back for a cross
    pub lookback: usize,
    pub per_trade_fraction: Decimal,
    pub max_positions: usize,
    pub stop_loss_fraction: Decimal,
    /// Calendar days of history requested per symbol
    pub history_days: u32,
}

impl Default for StrategySettings {
    fn default() -> Self {
        let strategy = GoldenCrossConfig::default();
        Self {
            short_window: strategy.short_window,
            long_window: strategy.long_window,
            lookback: 20,
            per_trade_fraction: strategy.per_trade_fraction,
            max_positions: 4,
            stop_loss_fraction: strategy.stop_loss_fraction,
            history_days: 300,
        }
    }
}

impl StrategySettings {
    pub fn golden_cross(&self) -> GoldenCrossConfig {
        GoldenCrossConfig {
            short_window: self.short_window,
            long_window: self.long_window,
            per_trade_fraction: self.per_trade_fraction,
            stop_loss_fraction: self.stop_loss_fraction,
        }
    }

    pub fn limits(&self) -> Result<PositionLimits, StrategyError> {
        PositionLimits::new(self.max_positions)
    }

    pub fn scanner(&self) -> Result<CrossoverScanner, StrategyError> {
        CrossoverScanner::new(self.short_window, self.long_window, self.lookback)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.golden_cross().validate()?;
        self.limits()?;
        self.scanner()?;

        let required = default_history_days(self.long_window);
        if self.history_days < required {
            return Err(SettingsError::Invalid(format!(
                "history_days ({}) cannot cover long_window ({}) trading days; need at least {}",
                self.history_days, self.long_window, required
            )));
        }
        Ok(())
    }
}

/// Ordered list of symbols to scan for buys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistSettings {
    pub symbols: Vec<String>,
}

impl WatchlistSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            let trimmed = symbol.trim();
            if trimmed.is_empty() {
                return Err(SettingsError::Invalid("watchlist contains an empty symbol".into()));
            }
            if !seen.insert(trimmed.to_ascii_uppercase()) {
                return Err(SettingsError::Invalid(format!(
                    "watchlist contains {} more than once",
                    trimmed
                )));
            }
        }
        Ok(())
    }
}

/// Where the agent writes its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub trade_log: String,
    pub reports_dir: String,
    pub html_reports: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            trade_log: "trade_log_multi.csv".to_string(),
            reports_dir: "daily_reports".to_string(),
            html_reports: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy.per_trade_fraction, dec!(0.25));
        assert_eq!(config.strategy.stop_loss_fraction, dec!(0.05));
        assert_eq!(config.alpaca.api_secret_env, "ALPACA_SECRET_KEY");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[strategy]
max_positions = 6
"#,
        )
        .unwrap();

        assert_eq!(config.strategy.max_positions, 6);
        assert_eq!(config.strategy.long_window, 200);
        assert!(config.watchlist.symbols.is_empty());
    }

    #[test]
    fn test_invalid_strategy_parameters() {
        let cases = [
            StrategySettings { short_window: 0, ..Default::default() },
            StrategySettings { short_window: 200, long_window: 200, ..Default::default() },
            StrategySettings { lookback: 0, ..Default::default() },
            StrategySettings { per_trade_fraction: dec!(1), ..Default::default() },
            StrategySettings { stop_loss_fraction: dec!(0), ..Default::default() },
            StrategySettings { max_positions: 0, ..Default::default() },
            StrategySettings { history_days: 150, ..Default::default() },
            StrategySettings { history_days: 200, ..Default::default() },
            StrategySettings { history_days: 299, ..Default::default() },
        ];
        for case in cases {
            assert!(
                matches!(case.validate(), Err(SettingsError::Invalid(_))),
                "{:?} should be rejected",
                case
            );
        }
    }

    #[test]
    fn test_history_days_tracks_long_window() {
        let exact = StrategySettings { history_days: 300, ..Default::default() };
        assert!(exact.validate().is_ok());

        let short = StrategySettings { long_window: 200, history_days: 200, ..Default::default() };
        let err = short.validate().unwrap_err();
        assert!(err.to_string().contains("need at least 300"), "{}", err);

        let small_windows = StrategySettings {
            short_window: 2,
            long_window: 3,
            history_days: 5,
            ..Default::default()
        };
        assert!(small_windows.validate().is_ok());
    }

    #[test]
    fn test_watchlist_validation() {
        let ok = WatchlistSettings { symbols: vec!["AAPL".into(), "MSFT".into()] };
        assert!(ok.validate().is_ok());

        let duplicate = WatchlistSettings { symbols: vec!["AAPL".into(), "aapl".into()] };
        assert!(duplicate.validate().is_err());

        let blank = WatchlistSettings { symbols: vec![" ".into()] };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_unknown_log_format() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }
}
