//! Market data trait definition.

use crate::error::DataError;
use crate::types::PriceHistory;
use async_trait::async_trait;

/// Trait for daily price history sources.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch trailing daily bars for a symbol.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `min_days` - Calendar days of history to cover
    ///
    /// # Returns
    /// Bars ordered oldest to newest. An unknown symbol or an empty result is
    /// an error, never an empty history.
    async fn fetch_price_history(
        &self,
        symbol: &str,
        min_days: u32,
    ) -> Result<PriceHistory, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
