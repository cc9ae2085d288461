//! Simulated position

use crate::types::PositionSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "OPEN"),
            PositionStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// A single paper position, opened by a BUY and closed by a SELL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique position ID
    pub id: String,
    pub token_id: String,
    /// Owning market slug
    pub market_id: String,
    /// Outcome name, e.g. "England"
    pub outcome: String,
    pub side: PositionSide,
    pub entry_price: Decimal,
    pub shares: Decimal,
    /// Cash committed at entry
    pub cost_basis: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_price: Option<Decimal>,
    pub exit_time: Option<DateTime<Utc>>,
    pub status: PositionStatus,
    pub reasoning: String,
}

impl Position {
    /// Create an open position
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        token_id: impl Into<String>,
        market_id: impl Into<String>,
        outcome: impl Into<String>,
        side: PositionSide,
        entry_price: Decimal,
        shares: Decimal,
        cost_basis: Decimal,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            token_id: token_id.into(),
            market_id: market_id.into(),
            outcome: outcome.into(),
            side,
            entry_price,
            shares,
            cost_basis,
            entry_time: Utc::now(),
            exit_price: None,
            exit_time: None,
            status: PositionStatus::Open,
            reasoning: reasoning.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Realized P&L; zero until the position is closed
    pub fn pnl(&self) -> Decimal {
        match (self.status, self.exit_price) {
            (PositionStatus::Closed, Some(exit)) => exit * self.shares - self.cost_basis,
            _ => Decimal::ZERO,
        }
    }

    /// Market value at the given price
    pub fn current_value(&self, current_price: Decimal) -> Decimal {
        current_price * self.shares
    }

    /// Unrealized P&L at the given price; zero once closed
    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        if self.is_open() {
            self.current_value(current_price) - self.cost_basis
        } else {
            Decimal::ZERO
        }
    }
}
