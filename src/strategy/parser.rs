//! Parser for the line-oriented decision format
//!
//! ```text
//! ACTION: BUY
//! OUTCOME: England
//! SIDE: YES
//! SIZE: 100
//! CONFIDENCE: 0.8
//! EDGE: 3.5
//! REASONING: Some explanation ...
//! ```

use crate::types::{MarketSnapshot, PositionSide, TradeAction, TradeDecision};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// Placeholder the prompt asks for when a field does not apply
pub const NOT_APPLICABLE: &str = "N/A";

pub const DEFAULT_REASONING: &str = "No reasoning provided";

/// Split each `key: value` line on its first colon. Keys are lower-cased,
/// later duplicates overwrite earlier ones, lines without a colon are skipped.
pub fn parse_fields(response: &str) -> HashMap<String, String> {
    response
        .trim()
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
        .collect()
}

/// Lenient decimal parse; plain or scientific notation
fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Turn model text into a decision, binding the outcome to a token in `snapshot`.
///
/// Malformed numbers fall back to their defaults instead of failing; a
/// confidence outside 0..=1 counts as malformed.
pub fn parse_decision(response: &str, snapshot: &MarketSnapshot) -> TradeDecision {
    let fields = parse_fields(response);
    let field = |key: &str| fields.get(key).map(String::as_str);

    let action = field("action")
        .map(TradeAction::from_keyword)
        .unwrap_or(TradeAction::Pass);

    let raw_outcome = field("outcome").filter(|o| !o.is_empty() && *o != NOT_APPLICABLE);
    let (outcome, token_id) = match raw_outcome {
        Some(raw) => match resolve_outcome(raw, snapshot) {
            Some((name, token)) => (Some(name.to_string()), Some(token.to_string())),
            None => (Some(raw.to_string()), None),
        },
        None => (None, None),
    };

    let number = |key: &str| field(key).and_then(parse_decimal).unwrap_or(Decimal::ZERO);

    let mut metadata = HashMap::new();
    metadata.insert(
        "raw_response".to_string(),
        serde_json::Value::String(response.to_string()),
    );

    TradeDecision {
        action,
        token_id,
        outcome,
        side: field("side")
            .map(PositionSide::from_keyword)
            .unwrap_or_default(),
        position_size: number("size"),
        confidence: field("confidence")
            .and_then(parse_decimal)
            .filter(|c| (Decimal::ZERO..=Decimal::ONE).contains(c))
            .unwrap_or(Decimal::ZERO),
        edge: field("edge")
            .filter(|e| *e != NOT_APPLICABLE)
            .and_then(parse_decimal),
        reasoning: field("reasoning")
            .unwrap_or(DEFAULT_REASONING)
            .to_string(),
        metadata,
    }
}

/// First snapshot outcome (in stored order) whose lower-cased name occurs
/// inside the lower-cased model text. Returns (canonical name, token id).
pub fn resolve_outcome<'a>(raw: &str, snapshot: &'a MarketSnapshot) -> Option<(&'a str, &'a str)> {
    let needle = raw.to_lowercase();
    snapshot
        .outcomes
        .iter()
        .find(|(name, _)| needle.contains(&name.to_lowercase()))
        .map(|(name, quote)| (name.as_str(), quote.token_id.as_str()))
}
