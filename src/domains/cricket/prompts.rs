//! Prompt wording for cricket match analysis

use crate::paper::Position;
use crate::strategy::PromptBuilder;
use crate::types::{to_percent, MarketSnapshot, PortfolioSummary};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct CricketPromptBuilder;

impl CricketPromptBuilder {
    pub fn new() -> Self {
        Self
    }
}

/// Price (0-1) rendered in cents with one decimal
fn cents(price: Decimal) -> String {
    format!("{:.1}", to_percent(price).round_dp(1))
}

/// Amount with thousands separators and `dp` decimals
fn grouped(value: Decimal, dp: u32) -> String {
    let rendered = format!("{:.*}", dp as usize, value.round_dp(dp));
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(rendered.len() + int_part.len() / 3);
    out.push_str(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn position_block(snapshot: &MarketSnapshot, pos: &Position) -> String {
    let current_value = snapshot
        .outcome(&pos.outcome)
        .map(|q| pos.current_value(q.buy_price))
        .unwrap_or(pos.cost_basis);

    format!(
        "\nEXISTING POSITION:\n\
         - Outcome: {}\n\
         - Entry price: {}c\n\
         - Shares: {:.0}\n\
         - Cost basis: ${:.2}\n\
         - Current value: ${:.2}\n",
        pos.outcome,
        cents(pos.entry_price),
        pos.shares.round(),
        pos.cost_basis.round_dp(2),
        current_value.round_dp(2),
    )
}

impl PromptBuilder for CricketPromptBuilder {
    fn build_analysis_prompt(
        &self,
        snapshot: &MarketSnapshot,
        summary: &PortfolioSummary,
        existing: Option<&Position>,
    ) -> String {
        let mut outcomes = String::new();
        for (i, (name, quote)) in snapshot.outcomes.iter().enumerate() {
            if i > 0 {
                outcomes.push('\n');
            }
            let price = cents(quote.buy_price);
            let _ = write!(outcomes, "  - {}: {}c (implied prob: {}%)", name, price, price);
        }

        let position = existing
            .map(|p| position_block(snapshot, p))
            .unwrap_or_default();
        let volume = grouped(snapshot.volume, 0);

        format!(
            "You are a sports betting trader analysing a cricket match on Polymarket.

MARKET DATA:
- Match: {title}
- Volume: ${volume}
- Liquidity: ${liquidity}
- Outcomes:
{outcomes}

PORTFOLIO STATE:
- Cash available: ${cash}
- Open positions: {open}
- Total value: ${total}
{position}

YOUR TASK:
Analyse this market and decide: BUY, SELL, HOLD, or PASS.

Consider:
1. Is there value? (Is the market price different from your estimate?)
2. Liquidity (Volume: ${volume})
3. Portfolio risk (Don't over-concentrate)
4. Position sizing (Risk 5-10% of capital on good opportunities)

Return your decision in this EXACT format:
ACTION: [BUY/SELL/HOLD/PASS]
OUTCOME: [team name if BUY/SELL, or N/A]
SIDE: [YES/NO]
SIZE: [dollar amount, e.g., 50]
CONFIDENCE: [0-1, e.g., 0.75]
EDGE: [percentage, e.g., 5.2, or N/A]
REASONING: [2-3 sentences explaining your decision]

Now analyse the market above:",
            title = snapshot.title,
            volume = volume,
            liquidity = grouped(snapshot.liquidity, 0),
            outcomes = outcomes,
            cash = grouped(summary.current_cash, 2),
            open = summary.open_positions,
            total = grouped(summary.total_value, 2),
            position = position,
        )
    }
}
