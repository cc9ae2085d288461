//! Polymarket REST clients and the market data seam used by the bot loop

pub mod clob;
pub mod gamma;

pub use clob::{ClobClient, PriceSide};
pub use gamma::{GammaClient, GammaEvent, GammaEventMarket, SportEntry};

use crate::error::Result;
use crate::types::MarketSnapshot;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Source of tradeable markets and their live prices
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Identifiers (slugs) of markets at or above `min_volume`
    async fn scan(&self, min_volume: Decimal) -> Result<Vec<String>>;

    /// Fresh priced snapshot for one market
    async fn collect(&self, market_id: &str) -> Result<MarketSnapshot>;
}
