//! LLM-driven paper trading bot for Polymarket
//!
//! Trades simulated cash against live prediction-market prices, letting a
//! language model decide what to buy and sell.
//!
//! ## Architecture
//!
//! ```text
//! MarketDataProvider (Gamma/CLOB) → Strategy (prompt → LLM → parser) → BotLoop
//!                                                                        ↓
//!                                              Portfolio (paper) + Recorder (SQLite)
//! ```

pub mod bot;
pub mod client;
pub mod config;
pub mod domains;
pub mod error;
pub mod model;
pub mod paper;
pub mod storage;
pub mod strategy;
pub mod types;
