//! CLOB (Central Limit Order Book) price queries
//!
//! Read-only: the bot trades on paper, so no order placement lives here.

use super::gamma::decimal_from_value;
use crate::error::{BotError, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Which side of the book to price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSide {
    Buy,
    Sell,
}

impl fmt::Display for PriceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSide::Buy => write!(f, "buy"),
            PriceSide::Sell => write!(f, "sell"),
        }
    }
}

/// CLOB API client for price lookups
#[derive(Clone)]
pub struct ClobClient {
    http: Client,
    base_url: String,
}

impl ClobClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Current price for one side of a token's book
    pub async fn get_price(&self, token_id: &str, side: PriceSide) -> Result<Decimal> {
        let url = format!("{}/price", self.base_url);
        let side = side.to_string();
        debug!("GET {} token_id={} side={}", url, token_id, side);

        let resp: Value = self
            .http
            .get(&url)
            .query(&[("token_id", token_id), ("side", side.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp.get("price")
            .and_then(decimal_from_value)
            .ok_or_else(|| BotError::Api(format!("Invalid price response for {}", token_id)))
    }
}
