//! File-backed price history and trade log.

mod cache;
mod csv_source;
mod trade_log;

pub use cache::HistoryCache;
pub use csv_source::CsvPriceSource;
pub use trade_log::{CsvTradeLog, TRADE_LOG_HEADER};
