//! Paper portfolio: cash plus open and closed positions

use super::position::{Position, PositionStatus};
use crate::types::PortfolioSummary;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

/// Portfolio mutation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("Insufficient cash: ${available:.2} < ${required:.2}")]
    InsufficientCash { required: Decimal, available: Decimal },

    #[error("Position not found for token_id: {0}")]
    PositionNotFound(String),
}

/// Paper trading portfolio.
///
/// Cash only moves through `open_position` and `close_position`, and
/// never goes below zero.
#[derive(Debug, Clone)]
pub struct Portfolio {
    starting_capital: Decimal,
    current_cash: Decimal,
    open_positions: Vec<Position>,
    closed_positions: Vec<Position>,
}

impl Portfolio {
    pub fn new(starting_capital: Decimal) -> Self {
        Self {
            starting_capital,
            current_cash: starting_capital,
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
        }
    }

    pub fn starting_capital(&self) -> Decimal {
        self.starting_capital
    }

    pub fn current_cash(&self) -> Decimal {
        self.current_cash
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open_positions
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed_positions
    }

    /// Whether there is enough cash for a trade of this cost
    pub fn can_open(&self, cost: Decimal) -> bool {
        self.current_cash >= cost
    }

    /// Debit the cost basis and track the position.
    ///
    /// Does not check for an existing position in the same market; callers
    /// use `get_position_for_market` first.
    pub fn open_position(&mut self, position: Position) -> Result<&Position, PortfolioError> {
        if !self.can_open(position.cost_basis) {
            warn!(
                "Insufficient cash: ${:.2} < ${:.2}",
                self.current_cash, position.cost_basis
            );
            return Err(PortfolioError::InsufficientCash {
                required: position.cost_basis,
                available: self.current_cash,
            });
        }

        self.current_cash -= position.cost_basis;
        info!(
            "Opened position: {} @ ${:.3} ({:.0} shares, cost: ${:.2})",
            position.outcome, position.entry_price, position.shares, position.cost_basis
        );
        self.open_positions.push(position);

        Ok(&self.open_positions[self.open_positions.len() - 1])
    }

    /// Close the open position for `token_id`, crediting `exit_price * shares`
    pub fn close_position(
        &mut self,
        token_id: &str,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
    ) -> Result<Position, PortfolioError> {
        let Some(idx) = self.open_positions.iter().position(|p| p.token_id == token_id) else {
            warn!("Position not found for token_id: {}", token_id);
            return Err(PortfolioError::PositionNotFound(token_id.to_string()));
        };

        let mut pos = self.open_positions.remove(idx);
        pos.exit_price = Some(exit_price);
        pos.exit_time = Some(exit_time);
        pos.status = PositionStatus::Closed;

        self.current_cash += exit_price * pos.shares;

        info!(
            "Closed position: {} @ ${:.3} (P&L: ${:.2})",
            pos.outcome,
            exit_price,
            pos.pnl()
        );
        self.closed_positions.push(pos.clone());

        Ok(pos)
    }

    /// Open position for a market, if any
    pub fn get_position_for_market(&self, market_id: &str) -> Option<&Position> {
        self.open_positions.iter().find(|p| p.market_id == market_id)
    }

    /// Cash plus open positions, marked at `prices` where known and at
    /// cost basis otherwise
    pub fn get_total_value(&self, prices: Option<&HashMap<String, Decimal>>) -> Decimal {
        self.open_positions
            .iter()
            .fold(self.current_cash, |total, pos| {
                match prices.and_then(|p| p.get(&pos.token_id)) {
                    Some(&price) => total + pos.current_value(price),
                    None => total + pos.cost_basis,
                }
            })
    }

    /// Total return in percent; zero when there is no starting capital
    pub fn get_pnl_percent(&self, prices: Option<&HashMap<String, Decimal>>) -> Decimal {
        if self.starting_capital.is_zero() {
            return Decimal::ZERO;
        }
        let total = self.get_total_value(prices);
        (total - self.starting_capital) / self.starting_capital * Decimal::ONE_HUNDRED
    }

    pub fn get_realized_pnl(&self) -> Decimal {
        self.closed_positions.iter().map(Position::pnl).sum()
    }

    /// Unrealized P&L over priced open positions; unpriced ones count as zero
    pub fn get_unrealized_pnl(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.open_positions
            .iter()
            .filter_map(|pos| prices.get(&pos.token_id).map(|&p| pos.unrealized_pnl(p)))
            .sum()
    }

    /// Read-only view for strategies
    pub fn summary(&self, prices: Option<&HashMap<String, Decimal>>) -> PortfolioSummary {
        PortfolioSummary {
            current_cash: self.current_cash,
            total_value: self.get_total_value(prices),
            open_positions: self.open_positions.len(),
        }
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new(Decimal::ONE_THOUSAND)
    }
}
