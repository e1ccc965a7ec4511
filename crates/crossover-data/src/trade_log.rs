//! Append-only CSV trade log.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;

use crossover_core::error::SinkError;
use crossover_core::traits::TradeRecorder;
use crossover_core::types::TradeIntent;

/// Column order of the log file.
pub const TRADE_LOG_HEADER: [&str; 6] = ["timestamp", "action", "reason", "ticker", "qty", "price"];

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    timestamp: String,
    action: &'a str,
    reason: String,
    ticker: &'a str,
    qty: u64,
    price: Decimal,
}

/// Trade recorder that appends one CSV row per executed trade.
///
/// The header is written only when the file is created.
pub struct CsvTradeLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvTradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, row: &TradeRow<'_>) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let is_new = std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new {
            writer
                .write_record(TRADE_LOG_HEADER)
                .map_err(|e| SinkError::Encoding(e.to_string()))?;
        }
        writer
            .serialize(row)
            .map_err(|e| SinkError::Encoding(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl TradeRecorder for CsvTradeLog {
    async fn record_trade(
        &self,
        intent: &TradeIntent,
        executed_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        let _guard = self.lock.lock().await;
        let row = TradeRow {
            timestamp: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            action: intent.action().as_str(),
            reason: intent.reason().to_string(),
            ticker: intent.symbol(),
            qty: intent.quantity(),
            price: executed_price.round_dp(2),
        };
        self.append(&row)
    }
}
