//! Configuration management

use crate::error::{BotError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Environment variable holding the OpenRouter key
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub markets: MarketsConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_starting_capital")]
    pub starting_capital: Decimal,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            starting_capital: default_starting_capital(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketsConfig {
    /// Minimum event volume (USD) to consider a market
    #[serde(default = "default_min_volume")]
    pub min_volume: Decimal,
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            min_volume: default_min_volume(),
            gamma_url: default_gamma_url(),
            clob_url: default_clob_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_duration_hours")]
    pub duration_hours: f64,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: f64,
}

/// Seconds as a `Duration`, saturating on values that do not fit
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

impl RunConfig {
    pub fn duration(&self) -> Duration {
        saturating_secs(self.duration_hours * 3600.0)
    }

    pub fn interval(&self) -> Duration {
        saturating_secs(self.interval_minutes * 60.0)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_hours: default_duration_hours(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// openrouter, openai, compatible (or ollama)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// BUY decisions below this confidence are downgraded to PASS
    #[serde(default = "default_min_confidence")]
    pub min_confidence: Decimal,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Local/compatible endpoints may run without a key
    pub fn requires_api_key(&self) -> bool {
        !matches!(
            self.provider.to_lowercase().as_str(),
            "compatible" | "ollama"
        )
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            min_confidence: default_min_confidence(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl DatabaseConfig {
    /// Path with `~` and env vars expanded
    pub fn expanded_path(&self) -> String {
        shellexpand::full(&self.path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| self.path.clone())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_starting_capital() -> Decimal {
    dec!(1000)
}
fn default_min_volume() -> Decimal {
    dec!(5000)
}
fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}
fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}
fn default_duration_hours() -> f64 {
    2.0
}
fn default_interval_minutes() -> f64 {
    5.0
}
fn default_provider() -> String {
    "openrouter".to_string()
}
fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}
fn default_min_confidence() -> Decimal {
    dec!(0.6)
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_db_path() -> String {
    "data/trading.db".to_string()
}

impl Config {
    /// Load configuration from an optional TOML file, `BOT__*` environment
    /// variables and `.env`, then validate it
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(Path::new(path)).required(false))
            .add_source(
                config::Environment::with_prefix("BOT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        if config.llm.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                config.llm.api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the bot cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.llm.requires_api_key() && self.llm.api_key.trim().is_empty() {
            return Err(BotError::Config(format!(
                "{} not found in environment",
                API_KEY_ENV
            )));
        }
        if self.llm.min_confidence < Decimal::ZERO || self.llm.min_confidence > Decimal::ONE {
            return Err(BotError::Config(format!(
                "min_confidence must be within 0..1, got {}",
                self.llm.min_confidence
            )));
        }
        if self.trading.starting_capital < Decimal::ZERO {
            return Err(BotError::Config(format!(
                "starting_capital must not be negative, got {}",
                self.trading.starting_capital
            )));
        }
        for (name, value, unit_secs) in [
            ("duration_hours", self.run.duration_hours, 3600.0),
            ("interval_minutes", self.run.interval_minutes, 60.0),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BotError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
            let fits = Duration::try_from_secs_f64(value * unit_secs)
                .ok()
                .and_then(|d| Instant::now().checked_add(d))
                .is_some();
            if !fits {
                return Err(BotError::Config(format!("{} is too large: {}", name, value)));
            }
        }
        Ok(())
    }
}
