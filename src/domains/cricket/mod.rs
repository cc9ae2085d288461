//! Cricket markets on Polymarket

mod prompts;
mod scanner;

pub use prompts::CricketPromptBuilder;
pub use scanner::{is_cricket_sport, moneyline_outcomes, CricketMarkets, CRICKET_KEYWORDS};
