//! Core types shared by the strategy, portfolio and bot loop

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Ratio (price, confidence) scaled by 100 for display. Falls back to the
/// raw value when the product does not fit a `Decimal`.
pub fn to_percent(ratio: Decimal) -> Decimal {
    ratio.checked_mul(Decimal::ONE_HUNDRED).unwrap_or(ratio)
}

/// Live pricing for a single outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeQuote {
    /// CLOB token bound to this outcome
    pub token_id: String,
    /// Price to buy one share (0-1)
    pub buy_price: Decimal,
    /// Price to sell one share (0-1)
    pub sell_price: Decimal,
    /// Absolute buy/sell spread
    pub spread: Decimal,
}

impl OutcomeQuote {
    /// Build a quote, deriving the spread from the two prices
    pub fn new(token_id: impl Into<String>, buy_price: Decimal, sell_price: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            buy_price,
            sell_price,
            spread: (buy_price - sell_price).abs().round_dp(4),
        }
    }
}

/// Point-in-time read of one market.
///
/// Outcomes are kept as an ordered list: outcome resolution in the
/// decision parser walks them in the order the provider returned them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub slug: String,
    pub title: String,
    pub volume: Decimal,
    pub liquidity: Decimal,
    pub outcomes: Vec<(String, OutcomeQuote)>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl MarketSnapshot {
    pub fn new(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            title: slug.clone(),
            slug,
            ..Default::default()
        }
    }

    /// Insert an outcome, replacing the quote in place if the name exists
    pub fn insert_outcome(&mut self, name: impl Into<String>, quote: OutcomeQuote) {
        let name = name.into();
        match self.outcomes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = quote,
            None => self.outcomes.push((name, quote)),
        }
    }

    /// Quote for an exact outcome name
    pub fn outcome(&self, name: &str) -> Option<&OutcomeQuote> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, q)| q)
    }
}

/// Strategy action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
    Pass,
}

impl TradeAction {
    /// Parse an action keyword; anything unrecognised is inert and maps to PASS
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "BUY" => TradeAction::Buy,
            "SELL" => TradeAction::Sell,
            "HOLD" => TradeAction::Hold,
            _ => TradeAction::Pass,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
            TradeAction::Pass => write!(f, "PASS"),
        }
    }
}

/// Position side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    #[default]
    Yes,
    No,
}

impl PositionSide {
    /// "NO" (any case) is No, everything else is Yes
    pub fn from_keyword(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("no") {
            PositionSide::No
        } else {
            PositionSide::Yes
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Yes => write!(f, "YES"),
            PositionSide::No => write!(f, "NO"),
        }
    }
}

/// Decision returned by a strategy for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub action: TradeAction,
    /// Token bound to the resolved outcome, if any
    pub token_id: Option<String>,
    /// Canonical outcome name when resolved, raw model text otherwise
    pub outcome: Option<String>,
    pub side: PositionSide,
    /// Dollar amount to commit
    pub position_size: Decimal,
    /// 0-1
    pub confidence: Decimal,
    /// Estimated edge in percent
    pub edge: Option<Decimal>,
    pub reasoning: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TradeDecision {
    /// A PASS carrying only a reason
    pub fn pass(reasoning: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Pass,
            token_id: None,
            outcome: None,
            side: PositionSide::Yes,
            position_size: Decimal::ZERO,
            confidence: Decimal::ZERO,
            edge: None,
            reasoning: reasoning.into(),
            metadata: HashMap::new(),
        }
    }

    /// BUY with both the outcome and its token resolved
    pub fn is_executable_buy(&self) -> bool {
        self.action == TradeAction::Buy
            && self.token_id.as_deref().is_some_and(|t| !t.is_empty())
            && self.outcome.as_deref().is_some_and(|o| !o.is_empty())
    }
}

/// Read-only portfolio view handed to strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub current_cash: Decimal,
    pub total_value: Decimal,
    pub open_positions: usize,
}
