//! Gamma API client for event discovery
//!
//! Public endpoints, no auth:
//!   GET /sports                 leagues with their series id
//!   GET /events?series_id=...   events (matches) for a league
//!   GET /events?slug=...        a single event with its sub-markets

use crate::error::Result;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

/// Tag for game-level bets (as opposed to futures)
pub const GAME_TAG_ID: &str = "100639";

/// Gamma API client
#[derive(Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
}

/// One row of `/sports`
#[derive(Debug, Clone, Deserialize)]
pub struct SportEntry {
    #[serde(default)]
    pub sport: String,
    /// Series id; the API returns it as a string or a number
    pub series: Option<Value>,
}

impl SportEntry {
    pub fn series_id(&self) -> Option<String> {
        match self.series.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GammaEvent {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub volume: Option<Value>,
    pub liquidity: Option<Value>,
    #[serde(default)]
    pub markets: Vec<GammaEventMarket>,
}

impl GammaEvent {
    pub fn volume(&self) -> Decimal {
        self.volume.as_ref().and_then(decimal_from_value).unwrap_or(Decimal::ZERO)
    }

    pub fn liquidity(&self) -> Decimal {
        self.liquidity.as_ref().and_then(decimal_from_value).unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GammaEventMarket {
    #[serde(rename = "sportsMarketType")]
    pub sports_market_type: Option<String>,
    /// JSON array or JSON-encoded string
    pub outcomes: Option<Value>,
    #[serde(rename = "outcomePrices")]
    pub outcome_prices: Option<Value>,
    #[serde(rename = "clobTokenIds")]
    pub clob_token_ids: Option<Value>,
}

/// Filters for `/events`
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub series_id: Option<String>,
    pub tag_id: Option<String>,
    pub active: bool,
    pub closed: bool,
    pub limit: u32,
    pub offset: u32,
    pub order: String,
    pub ascending: bool,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            series_id: None,
            tag_id: None,
            active: true,
            closed: false,
            limit: 50,
            offset: 0,
            order: "startDate".to_string(),
            ascending: true,
        }
    }
}

impl EventQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("active", self.active.to_string()),
            ("closed", self.closed.to_string()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("order", self.order.clone()),
            ("ascending", self.ascending.to_string()),
        ];
        if let Some(series_id) = &self.series_id {
            params.push(("series_id", series_id.clone()));
        }
        if let Some(tag_id) = &self.tag_id {
            params.push(("tag_id", tag_id.clone()));
        }
        params
    }
}

impl GammaClient {
    /// Create a new Gamma client
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} params={:?}", url, params);
        let resp = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }

    /// Every sport/league with its series id
    pub async fn list_sports(&self) -> Result<Vec<SportEntry>> {
        let value = self.get("/sports", &[]).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Events matching `query`
    pub async fn list_events(&self, query: &EventQuery) -> Result<Vec<GammaEvent>> {
        let value = self.get("/events", &query.to_params()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// A single event by slug, including its sub-markets
    pub async fn get_event_by_slug(&self, slug: &str) -> Result<Option<GammaEvent>> {
        let value = self.get("/events", &[("slug", slug.to_string())]).await?;
        first_event(value)
    }
}

/// `/events?slug=` answers with an array or a bare object
fn first_event(value: Value) -> Result<Option<GammaEvent>> {
    let event = match value {
        Value::Array(items) => items.into_iter().next(),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    };
    Ok(event.map(serde_json::from_value::<GammaEvent>).transpose()?)
}

/// Number or numeric string
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .ok(),
        _ => None,
    }
}

/// A list field that may arrive as a JSON array or a JSON-encoded string
pub fn json_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// List element as plain text
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
