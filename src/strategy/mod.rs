//! Trading strategies
//!
//! A strategy looks at one market snapshot and returns a `TradeDecision`.
//! It sees a read-only `PortfolioSummary`, never the portfolio itself.

mod llm;
pub mod parser;


pub use llm::LlmStrategy;
pub use parser::parse_decision;

use crate::paper::Position;
use crate::types::{MarketSnapshot, PortfolioSummary, TradeDecision};
use async_trait::async_trait;

/// Decision engine consulted once per market per cycle
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Decide what to do with this market.
    ///
    /// Never fails: every error path resolves to a PASS decision.
    async fn analyze(
        &self,
        snapshot: &MarketSnapshot,
        summary: &PortfolioSummary,
        existing: Option<&Position>,
    ) -> TradeDecision;
}

/// Domain-specific prompt rendering (cricket, crypto, ...)
pub trait PromptBuilder: Send + Sync {
    fn build_analysis_prompt(
        &self,
        snapshot: &MarketSnapshot,
        summary: &PortfolioSummary,
        existing: Option<&Position>,
    ) -> String;
}
