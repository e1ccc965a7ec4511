//! CSV price history source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use tokio::sync::Mutex;
use tracing::debug;

use crossover_core::error::DataError;
use crossover_core::traits::MarketData;
use crossover_core::types::{PriceBar, PriceHistory};

use crate::cache::HistoryCache;

const DATE_COLUMNS: [&str; 3] = ["date", "timestamp", "datetime"];
const CLOSE_COLUMNS: [&str; 2] = ["close", "adj close"];

/// Reads daily closes from `<dir>/<SYMBOL>.csv`.
///
/// Each file needs a header row with a date column and a close column
/// (`Close` preferred over `Adj Close`). Files are parsed once and cached.
pub struct CsvPriceSource {
    dir: PathBuf,
    cache: Mutex<HistoryCache>,
}

impl CsvPriceSource {
    /// Create a source over a directory of per-symbol files.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DataError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(DataError::NoDataAvailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(Self {
            dir,
            cache: Mutex::new(HistoryCache::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, symbol: &str) -> Option<PathBuf> {
        [symbol.to_string(), symbol.to_ascii_uppercase(), symbol.to_ascii_lowercase()]
            .into_iter()
            .map(|name| self.dir.join(format!("{}.csv", name)))
            .find(|path| path.is_file())
    }

    async fn load(&self, symbol: &str) -> Result<std::sync::Arc<PriceHistory>, DataError> {
        let mut cache = self.cache.lock().await;
        if let Some(history) = cache.get(symbol) {
            return Ok(history);
        }

        let path = self
            .file_for(symbol)
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;
        let bars = read_bars(&path)?;
        debug!(symbol = %symbol, bars = bars.len(), path = %path.display(), "Loaded CSV history");

        Ok(cache.put(symbol, PriceHistory::new(symbol.to_ascii_uppercase(), bars)))
    }
}

#[async_trait]
impl MarketData for CsvPriceSource {
    async fn fetch_price_history(&self, symbol: &str, min_days: u32) -> Result<PriceHistory, DataError> {
        let full = self.load(symbol).await?;
        let last = full
            .last()
            .ok_or_else(|| DataError::NoDataAvailable(symbol.to_string()))?
            .date;

        let cutoff = last - Duration::days(i64::from(min_days));
        let keep = full.bars().iter().filter(|b| b.date >= cutoff).count();

        let mut history = (*full).clone();
        history.truncate_front(keep);
        Ok(history)
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

/// Read all bars from one file. Blank closes load as NaN.
fn read_bars(path: &Path) -> Result<Vec<PriceBar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(e.to_string()))?
        .clone();
    let date_col = column(&headers, &DATE_COLUMNS)
        .ok_or_else(|| DataError::ParseError(format!("{}: no date column", path.display())))?;
    let close_col = column(&headers, &CLOSE_COLUMNS)
        .ok_or_else(|| DataError::ParseError(format!("{}: no close column", path.display())))?;

    let mut bars = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let raw_date = record.get(date_col).unwrap_or_default();
        let raw_close = record.get(close_col).unwrap_or_default().trim();

        let date = parse_date(raw_date)?;
        let close = if raw_close.is_empty() {
            f64::NAN
        } else {
            raw_close.parse::<f64>().map_err(|_| {
                DataError::ParseError(format!("invalid close '{}' on {}", raw_close, date))
            })?
        };
        bars.push(PriceBar::new(date, close));
    }

    Ok(bars)
}

/// Parse the date formats commonly found in exported daily data.
fn parse_date(raw: &str) -> Result<NaiveDate, DataError> {
    let raw = raw.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.date_naive());
    }

    Err(DataError::ParseError(format!("could not parse date: {}", raw)))
}
