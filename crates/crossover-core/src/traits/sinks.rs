//! Persistence and reporting sinks.

use crate::error::SinkError;
use crate::types::{RunSummary, TradeIntent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Records executed trades.
#[async_trait]
pub trait TradeRecorder: Send + Sync {
    /// Append one trade.
    async fn record_trade(
        &self,
        intent: &TradeIntent,
        executed_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError>;
}

/// Receives the end-of-pass summary.
#[async_trait]
pub trait SummaryPublisher: Send + Sync {
    async fn publish_summary(&self, summary: &RunSummary) -> Result<(), SinkError>;
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl TradeRecorder for NullSink {
    async fn record_trade(
        &self,
        _intent: &TradeIntent,
        _executed_price: Decimal,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}

#[async_trait]
impl SummaryPublisher for NullSink {
    async fn publish_summary(&self, _summary: &RunSummary) -> Result<(), SinkError> {
        Ok(())
    }
}
