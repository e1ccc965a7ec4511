//! Mutable state of one evaluation pass.

use rust_decimal::Decimal;

use crossover_core::types::{AccountSnapshot, FailureStage, Position, SymbolFailure, TradeIntent};
use crossover_strategy::BuyBudget;

/// Cash and book as seen by the pass. Created at pass start, discarded at
/// pass end.
///
/// Updated in-process after every accepted intent; refreshed from the
/// account only at the post-sell checkpoint.
#[derive(Debug, Clone)]
pub struct RunState {
    sizing_basis: Decimal,
    portfolio_value: Decimal,
    available_cash: Decimal,
    open_positions: Vec<Position>,
}

impl RunState {
    pub fn new(account: AccountSnapshot, positions: Vec<Position>) -> Self {
        Self {
            sizing_basis: account.portfolio_value,
            portfolio_value: account.portfolio_value,
            available_cash: account.cash,
            open_positions: positions,
        }
    }

    /// Portfolio value snapshotted at pass start. Fixed for the pass.
    pub fn sizing_basis(&self) -> Decimal {
        self.sizing_basis
    }

    pub fn portfolio_value(&self) -> Decimal {
        self.portfolio_value
    }

    pub fn available_cash(&self) -> Decimal {
        self.available_cash
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open_positions
    }

    pub fn open_count(&self) -> usize {
        self.open_positions.len()
    }

    pub fn holds(&self, symbol: &str) -> bool {
        self.open_positions.iter().any(|p| p.symbol == symbol)
    }

    pub fn budget(&self) -> BuyBudget {
        BuyBudget {
            sizing_basis: self.sizing_basis,
            available_cash: self.available_cash,
        }
    }

    /// Close a position, crediting the estimated proceeds.
    pub fn apply_sell(&mut self, intent: &TradeIntent) -> Option<Position> {
        let index = self
            .open_positions
            .iter()
            .position(|p| p.symbol == intent.symbol())?;
        self.available_cash += intent.notional();
        Some(self.open_positions.remove(index))
    }

    /// Open a position, debiting quantity * reference price.
    pub fn apply_buy(&mut self, intent: &TradeIntent) {
        self.available_cash -= intent.notional();
        self.open_positions.push(Position::new(
            intent.symbol(),
            intent.quantity(),
            intent.reference_price(),
        ));
    }

    /// Replace cash and portfolio value with a fresh account reading.
    pub fn refresh(&mut self, account: AccountSnapshot) {
        self.available_cash = account.cash;
        self.portfolio_value = account.portfolio_value;
    }
}

/// What the pass did, collected for the summary.
#[derive(Debug, Clone, Default)]
pub struct PassTally {
    pub intents: Vec<TradeIntent>,
    pub failures: Vec<SymbolFailure>,
    pub symbols_scanned: usize,
    pub golden_crosses_found: usize,
}

impl PassTally {
    pub fn fail(&mut self, symbol: &str, stage: FailureStage, message: impl ToString) {
        self.failures.push(SymbolFailure {
            symbol: symbol.to_string(),
            stage,
            message: message.to_string(),
        });
    }
}
