//! Broker trait definition.

use crate::error::BrokerError;
use crate::types::{AccountSnapshot, OrderConfirmation, OrderRequest, Position};
use async_trait::async_trait;

/// Trait for brokerage account integrations.
///
/// Every call either returns a valid result or signals failure; retries and
/// timeouts are the implementation's concern.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Get cash and portfolio value.
    async fn get_account(&self) -> Result<AccountSnapshot, BrokerError>;

    /// Get all open positions, in the order the account reports them.
    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Check if the trading session is currently open.
    async fn is_market_open(&self) -> Result<bool, BrokerError>;

    /// Submit a market order.
    ///
    /// # Arguments
    /// * `request` - The order request to submit
    ///
    /// # Returns
    /// The broker's acknowledgement
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderConfirmation, BrokerError>;

    /// Get the broker name.
    fn name(&self) -> &str;
}
