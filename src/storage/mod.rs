//! Session persistence
//!
//! The bot loop reports what happened through a `Recorder`. `Database`
//! writes to SQLite; `NullRecorder` drops everything.

mod database;

pub use database::Database;

use crate::error::Result;
use crate::paper::Position;
use crate::types::{MarketSnapshot, TradeAction, TradeDecision};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// One analyzed decision, as logged to the `decisions` table
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub cycle: u64,
    pub match_slug: String,
    pub action: TradeAction,
    pub reasoning: String,
    pub confidence: Decimal,
    pub edge: Option<Decimal>,
    /// Snapshot the decision was made on, as JSON
    pub market_data: Option<String>,
}

impl DecisionRecord {
    pub fn new(cycle: u64, snapshot: &MarketSnapshot, decision: &TradeDecision) -> Self {
        Self {
            timestamp: Utc::now(),
            cycle,
            match_slug: snapshot.slug.clone(),
            action: decision.action,
            reasoning: decision.reasoning.clone(),
            confidence: decision.confidence,
            edge: decision.edge,
            market_data: serde_json::to_string(snapshot).ok(),
        }
    }
}

/// End-of-cycle portfolio snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioStateRecord {
    pub timestamp: DateTime<Utc>,
    pub cash: Decimal,
    pub total_value: Decimal,
    /// Dollar P&L against starting capital
    pub pnl: Decimal,
    pub num_open_positions: usize,
}

/// Sink for session events
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn record_portfolio_state(&self, state: &PortfolioStateRecord) -> Result<()>;

    async fn record_decision(&self, decision: &DecisionRecord) -> Result<()>;

    async fn record_position_opened(&self, position: &Position) -> Result<()>;

    /// Updates the row written by `record_position_opened`
    async fn record_position_closed(&self, position: &Position) -> Result<()>;
}

/// Recorder that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

#[async_trait]
impl Recorder for NullRecorder {
    async fn record_portfolio_state(&self, _state: &PortfolioStateRecord) -> Result<()> {
        Ok(())
    }

    async fn record_decision(&self, _decision: &DecisionRecord) -> Result<()> {
        Ok(())
    }

    async fn record_position_opened(&self, _position: &Position) -> Result<()> {
        Ok(())
    }

    async fn record_position_closed(&self, _position: &Position) -> Result<()> {
        Ok(())
    }
}
