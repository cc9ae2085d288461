//! SQLite store for portfolio snapshots, positions and decisions

use super::{DecisionRecord, PortfolioStateRecord, Recorder};
use crate::error::{BotError, Result};
use crate::paper::Position;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

const TABLES: [&str; 3] = ["portfolio_state", "positions", "decisions"];

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS portfolio_state (
        timestamp INTEGER PRIMARY KEY,
        cash REAL NOT NULL,
        total_value REAL NOT NULL,
        pnl REAL NOT NULL,
        num_open_positions INTEGER DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS positions (
        id TEXT PRIMARY KEY,
        token_id TEXT NOT NULL,
        match_slug TEXT NOT NULL,
        outcome TEXT NOT NULL,
        side TEXT NOT NULL,
        entry_price REAL NOT NULL,
        shares REAL NOT NULL,
        cost_basis REAL NOT NULL,
        entry_time INTEGER NOT NULL,
        exit_price REAL,
        exit_time INTEGER,
        pnl REAL,
        reasoning TEXT,
        status TEXT NOT NULL DEFAULT 'OPEN'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS decisions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        cycle INTEGER,
        match_slug TEXT NOT NULL,
        action TEXT NOT NULL,
        reasoning TEXT,
        confidence REAL,
        edge REAL,
        market_data TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_positions_status ON positions(status)",
    "CREATE INDEX IF NOT EXISTS idx_positions_match ON positions(match_slug)",
    "CREATE INDEX IF NOT EXISTS idx_decisions_timestamp ON decisions(timestamp)",
];

/// REAL columns; SQLite has no decimal type
fn real(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file and ensure the schema
    pub async fn connect(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    BotError::Internal(format!(
                        "Cannot create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        info!("Database ready: {}", path);
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Drop every table and recreate an empty schema
    pub async fn reset(&self) -> Result<()> {
        for table in TABLES {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
                .execute(&self.pool)
                .await?;
        }
        self.init_schema().await?;
        info!("Database reset");
        Ok(())
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        if !TABLES.contains(&table) {
            return Err(BotError::Internal(format!(
                "Unknown table: {}",
                table
            )));
        }
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Recorder for Database {
    async fn record_portfolio_state(&self, state: &PortfolioStateRecord) -> Result<()> {
        // One row per second; a later snapshot in the same second wins
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO portfolio_state
                (timestamp, cash, total_value, pnl, num_open_positions)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(state.timestamp.timestamp())
        .bind(real(state.cash))
        .bind(real(state.total_value))
        .bind(real(state.pnl))
        .bind(state.num_open_positions as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_decision(&self, decision: &DecisionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions
                (timestamp, cycle, match_slug, action, reasoning, confidence, edge, market_data)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(decision.timestamp.timestamp())
        .bind(decision.cycle as i64)
        .bind(&decision.match_slug)
        .bind(decision.action.to_string())
        .bind(&decision.reasoning)
        .bind(real(decision.confidence))
        .bind(decision.edge.map(real))
        .bind(decision.market_data.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_position_opened(&self, position: &Position) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO positions
                (id, token_id, match_slug, outcome, side, entry_price, shares,
                 cost_basis, entry_time, reasoning, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&position.id)
        .bind(&position.token_id)
        .bind(&position.market_id)
        .bind(&position.outcome)
        .bind(position.side.to_string())
        .bind(real(position.entry_price))
        .bind(real(position.shares))
        .bind(real(position.cost_basis))
        .bind(position.entry_time.timestamp())
        .bind(&position.reasoning)
        .bind(position.status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_position_closed(&self, position: &Position) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE positions
            SET exit_price = ?, exit_time = ?, pnl = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(position.exit_price.map(real))
        .bind(position.exit_time.map(|t| t.timestamp()))
        .bind(real(position.pnl()))
        .bind(position.status.to_string())
        .bind(&position.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
