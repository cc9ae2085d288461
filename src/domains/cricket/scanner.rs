//! Cricket market discovery and live snapshot collection

use crate::client::gamma::{decimal_from_value, json_list, value_to_string, EventQuery, GAME_TAG_ID};
use crate::client::{ClobClient, GammaClient, GammaEvent, MarketDataProvider, PriceSide};
use crate::error::{BotError, Result};
use crate::types::{MarketSnapshot, OutcomeQuote};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Substrings identifying cricket leagues in `/sports`
pub const CRICKET_KEYWORDS: &[&str] = &["cri", "t20", "ipl", "bbl", "bpl", "sa20", "ilt20", "wpl"];

const MONEYLINE: &str = "moneyline";
const EVENTS_PER_SERIES: u32 = 30;

pub fn is_cricket_sport(sport: &str) -> bool {
    let sport = sport.to_lowercase();
    CRICKET_KEYWORDS.iter().any(|kw| sport.contains(kw))
}

/// Outcomes of the first moneyline market as (name, token id, gamma price).
/// Outcomes without a token id are dropped.
pub fn moneyline_outcomes(event: &GammaEvent) -> Vec<(String, String, Decimal)> {
    let Some(market) = event
        .markets
        .iter()
        .find(|m| m.sports_market_type.as_deref() == Some(MONEYLINE))
    else {
        return Vec::new();
    };

    let names = json_list(market.outcomes.as_ref());
    let prices = json_list(market.outcome_prices.as_ref());
    let tokens = json_list(market.clob_token_ids.as_ref());

    names
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let name = value_to_string(name)?;
            let token = tokens.get(i).and_then(value_to_string).filter(|t| !t.is_empty())?;
            let price = prices
                .get(i)
                .and_then(decimal_from_value)
                .unwrap_or(Decimal::ZERO);
            Some((name, token, price))
        })
        .collect()
}

/// Cricket market data over Gamma (discovery) and CLOB (live prices)
pub struct CricketMarkets {
    gamma: GammaClient,
    clob: ClobClient,
}

impl CricketMarkets {
    pub fn new(gamma: GammaClient, clob: ClobClient) -> Self {
        Self { gamma, clob }
    }

    /// Live buy/sell for a token, falling back to the cached Gamma price
    async fn quote(&self, token_id: &str, fallback: Decimal) -> OutcomeQuote {
        let buy = self.clob.get_price(token_id, PriceSide::Buy).await;
        let sell = self.clob.get_price(token_id, PriceSide::Sell).await;
        match (buy, sell) {
            (Ok(buy), Ok(sell)) => OutcomeQuote::new(token_id, buy, sell),
            (Err(e), _) | (_, Err(e)) => {
                debug!("CLOB price failed for {}, using Gamma price: {}", token_id, e);
                OutcomeQuote::new(token_id, fallback, fallback)
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for CricketMarkets {
    async fn scan(&self, min_volume: Decimal) -> Result<Vec<String>> {
        let sports = self.gamma.list_sports().await?;
        let series_ids: Vec<String> = sports
            .iter()
            .filter(|s| is_cricket_sport(&s.sport))
            .filter_map(|s| s.series_id())
            .collect();

        if series_ids.is_empty() {
            warn!("No cricket leagues found on Polymarket");
            return Ok(Vec::new());
        }

        let mut slugs = Vec::new();
        for series_id in series_ids {
            let query = EventQuery {
                series_id: Some(series_id.clone()),
                tag_id: Some(GAME_TAG_ID.to_string()),
                limit: EVENTS_PER_SERIES,
                ..Default::default()
            };
            match self.gamma.list_events(&query).await {
                Ok(events) => {
                    slugs.extend(
                        events
                            .into_iter()
                            .filter(|e| e.volume() >= min_volume)
                            .filter_map(|e| e.slug.filter(|s| !s.is_empty())),
                    );
                }
                Err(e) => debug!("No matches for series {}: {}", series_id, e),
            }
        }

        info!("Scan found {} cricket matches above ${} volume", slugs.len(), min_volume);
        Ok(slugs)
    }

    async fn collect(&self, market_id: &str) -> Result<MarketSnapshot> {
        let event = self
            .gamma
            .get_event_by_slug(market_id)
            .await?
            .ok_or_else(|| BotError::MarketNotFound(market_id.to_string()))?;

        let mut snapshot = MarketSnapshot::new(market_id);
        if let Some(title) = event.title.clone().filter(|t| !t.is_empty()) {
            snapshot.title = title;
        }
        snapshot.volume = event.volume();
        snapshot.liquidity = event.liquidity();

        for (name, token_id, gamma_price) in moneyline_outcomes(&event) {
            let quote = self.quote(&token_id, gamma_price).await;
            snapshot.insert_outcome(name, quote);
        }

        Ok(snapshot)
    }
}
