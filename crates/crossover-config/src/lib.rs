//! Configuration management.

mod settings;

pub use settings::{
    AlpacaSettings, AppConfig, AppSettings, LoggingConfig, OutputSettings, SettingsError,
    StrategySettings, WatchlistSettings,
};

use config::{Config, Environment, File};
use std::path::Path;

/// Load configuration from file and `CROSSOVER__`-prefixed environment
/// variables, then validate it.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("CROSSOVER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(
            &path,
            r#"
[strategy]
short_window = 5
long_window = 20
max_positions = 2

[watchlist]
symbols = ["AAPL", "MSFT"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.strategy.short_window, 5);
        assert_eq!(config.strategy.max_positions, 2);
        assert_eq!(config.strategy.lookback, 20);
        assert_eq!(config.watchlist.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(config.output.trade_log, "trade_log_multi.csv");
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(&path, "[strategy]\nshort_window = 200\nlong_window = 50\n").unwrap();

        assert!(matches!(load_config(&path), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(SettingsError::Load(_))));
    }

    #[test]
    fn test_shipped_default_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.strategy.long_window, 200);
        assert!(config.watchlist.symbols.len() > 400);
    }
}
