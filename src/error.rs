//! Error types for the paper trading bot

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, BotError>;

/// Top-level bot error
#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Market not found: {0}")]
    MarketNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for BotError {
    fn from(e: config::ConfigError) -> Self {
        BotError::Config(e.to_string())
    }
}
