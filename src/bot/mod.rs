//! Trading loop
//!
//! Each cycle scans for markets, then for every market collects a fresh
//! snapshot, asks the strategy for a decision and applies it to the paper
//! portfolio. Cycles repeat on a fixed interval until the session duration
//! elapses, then a `SessionReport` is produced.
//!
//! Nothing in a cycle is fatal: provider, strategy and recorder failures are
//! logged and the loop moves on.

#[cfg(test)]
mod tests;

use crate::client::MarketDataProvider;
use crate::config::Config;
use crate::error::Result;
use crate::paper::{Portfolio, PortfolioError, Position};
use crate::storage::{DecisionRecord, PortfolioStateRecord, Recorder};
use crate::strategy::Strategy;
use crate::types::{to_percent, MarketSnapshot, TradeAction, TradeDecision};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Loop timing and market filter
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub min_volume: Decimal,
    pub duration: Duration,
    pub interval: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            min_volume: dec!(5000),
            duration: Duration::from_secs(2 * 3600),
            interval: Duration::from_secs(5 * 60),
        }
    }
}

impl BotConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_volume: config.markets.min_volume,
            duration: config.run.duration(),
            interval: config.run.interval(),
        }
    }
}

/// End-of-session figures
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub cycles: u64,
    /// Configured session length
    pub duration: Duration,
    pub starting_capital: Decimal,
    pub final_value: Decimal,
    pub total_pnl: Decimal,
    pub pnl_percent: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub closed_positions: usize,
    pub open_positions: usize,
}

impl SessionReport {
    pub fn log(&self) {
        info!("🏁 TRADING SESSION COMPLETE");
        info!(
            "Duration: {:.2} hours ({} cycles)",
            self.duration.as_secs_f64() / 3600.0,
            self.cycles
        );
        info!("Starting Capital: ${:.2}", self.starting_capital);
        info!("Final Value: ${:.2}", self.final_value);
        info!(
            "Total P&L: ${:.2} ({:.2}%)",
            self.total_pnl, self.pnl_percent
        );
        info!("Realized P&L: ${:.2}", self.realized_pnl);
        info!("Unrealized P&L: ${:.2}", self.unrealized_pnl);
        info!("Closed Trades: {}", self.closed_positions);
        info!("Open Positions: {}", self.open_positions);
    }
}

/// Paper trading session over one provider and one strategy
pub struct BotLoop {
    provider: Box<dyn MarketDataProvider>,
    strategy: Box<dyn Strategy>,
    recorder: Box<dyn Recorder>,
    portfolio: Portfolio,
    /// Last known price per token of an open position
    prices: HashMap<String, Decimal>,
    config: BotConfig,
}

impl BotLoop {
    pub fn new(
        provider: Box<dyn MarketDataProvider>,
        strategy: Box<dyn Strategy>,
        recorder: Box<dyn Recorder>,
        starting_capital: Decimal,
        config: BotConfig,
    ) -> Self {
        Self {
            provider,
            strategy,
            recorder,
            portfolio: Portfolio::new(starting_capital),
            prices: HashMap::new(),
            config,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn prices(&self) -> &HashMap<String, Decimal> {
        &self.prices
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run cycles until the configured duration has elapsed
    pub async fn run(&mut self) -> SessionReport {
        info!("🤖 Paper trading session started");
        info!("Strategy: {}", self.strategy.name());
        info!("Starting capital: ${:.2}", self.portfolio.starting_capital());
        info!(
            "Duration: {:?} | Interval: {:?}",
            self.config.duration, self.config.interval
        );

        // No representable deadline means run until stopped
        let deadline = Instant::now().checked_add(self.config.duration);
        let mut cycle = 0;

        while deadline.map_or(true, |d| Instant::now() < d) {
            cycle += 1;
            let cycle_start = Instant::now();

            self.run_cycle(cycle).await;

            match self.config.interval.checked_sub(cycle_start.elapsed()) {
                Some(remaining) if !remaining.is_zero() => {
                    info!("Next scan in {}s", remaining.as_secs());
                    sleep(remaining).await;
                }
                _ => warn!("Cycle took longer than interval"),
            }
        }

        let report = self.report(cycle);
        report.log();
        report
    }

    /// One scan and process pass. Returns the number of markets scanned.
    pub async fn run_cycle(&mut self, cycle: u64) -> usize {
        info!(
            "📊 Cycle #{} | Value: ${:.2} | Cash: ${:.2} | Open: {} | P&L: {:.2}%",
            cycle,
            self.portfolio.get_total_value(Some(&self.prices)),
            self.portfolio.current_cash(),
            self.portfolio.open_positions().len(),
            self.portfolio.get_pnl_percent(Some(&self.prices)),
        );

        let slugs = match self.provider.scan(self.config.min_volume).await {
            Ok(slugs) => slugs,
            Err(e) => {
                error!("Market scan failed: {}", e);
                Vec::new()
            }
        };
        info!("[SCAN] Found {} active markets", slugs.len());

        for slug in &slugs {
            self.process_market(slug, cycle).await;
        }

        self.end_cycle(cycle).await;
        slugs.len()
    }

    async fn end_cycle(&mut self, cycle: u64) {
        let total_value = self.portfolio.get_total_value(Some(&self.prices));
        info!(
            "End of cycle #{} | Value: ${:.2} | Cash: ${:.2} | Open: {} | P&L: {:.2}%",
            cycle,
            total_value,
            self.portfolio.current_cash(),
            self.portfolio.open_positions().len(),
            self.portfolio.get_pnl_percent(Some(&self.prices)),
        );

        let state = PortfolioStateRecord {
            timestamp: Utc::now(),
            cash: self.portfolio.current_cash(),
            total_value,
            pnl: total_value - self.portfolio.starting_capital(),
            num_open_positions: self.portfolio.open_positions().len(),
        };
        if let Err(e) = self.recorder.record_portfolio_state(&state).await {
            warn!("Failed to record portfolio state: {}", e);
        }
    }

    /// Collect, analyze and act on a single market
    pub async fn process_market(&mut self, slug: &str, cycle: u64) {
        let snapshot = match self.provider.collect(slug).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error processing {}: {}", slug, e);
                return;
            }
        };
        info!("[ANALYZE] {}", snapshot.title);
        info!(
            "    Volume: ${:.0} | Liquidity: ${:.0}",
            snapshot.volume, snapshot.liquidity
        );

        let existing = self.portfolio.get_position_for_market(slug).cloned();
        if let Some(pos) = &existing {
            match snapshot.outcome(&pos.outcome) {
                Some(quote) => {
                    self.prices.insert(pos.token_id.clone(), quote.buy_price);
                    info!(
                        "    EXISTING: {} @ {:.1}c (Unrealized P&L: ${:.2})",
                        pos.outcome,
                        to_percent(pos.entry_price),
                        pos.unrealized_pnl(quote.buy_price)
                    );
                }
                None => warn!("Outcome {} not found in snapshot for {}", pos.outcome, slug),
            }
        }

        let summary = self.portfolio.summary(Some(&self.prices));
        let decision = self
            .strategy
            .analyze(&snapshot, &summary, existing.as_ref())
            .await;
        log_decision(&decision);

        let record = DecisionRecord::new(cycle, &snapshot, &decision);
        if let Err(e) = self.recorder.record_decision(&record).await {
            warn!("Failed to record decision for {}: {}", slug, e);
        }

        match (decision.action, existing) {
            (TradeAction::Buy, _) if decision.is_executable_buy() => {
                self.execute_buy(&decision, &snapshot).await
            }
            (TradeAction::Sell, Some(pos)) => self.execute_sell(&snapshot, &pos).await,
            _ => {}
        }
    }

    /// Collect and analyze one market without touching the portfolio
    pub async fn analyze_market(&self, slug: &str) -> Result<(MarketSnapshot, TradeDecision)> {
        let snapshot = self.provider.collect(slug).await?;
        let existing = self.portfolio.get_position_for_market(slug);
        let summary = self.portfolio.summary(Some(&self.prices));
        let decision = self.strategy.analyze(&snapshot, &summary, existing).await;
        Ok((snapshot, decision))
    }

    async fn execute_buy(&mut self, decision: &TradeDecision, snapshot: &MarketSnapshot) {
        if self.portfolio.get_position_for_market(&snapshot.slug).is_some() {
            warn!("Already holding a position in {}, skipping BUY", snapshot.slug);
            return;
        }
        if decision.position_size <= Decimal::ZERO {
            warn!("Non-positive size {} for {}, skipping BUY", decision.position_size, snapshot.slug);
            return;
        }

        let (Some(outcome), Some(token_id)) = (&decision.outcome, &decision.token_id) else {
            return;
        };
        let Some(quote) = snapshot.outcome(outcome) else {
            warn!("Outcome {} not in snapshot, skipping BUY", outcome);
            return;
        };

        let buy_price = quote.buy_price;
        let shares = decision
            .position_size
            .checked_div(buy_price)
            .unwrap_or(Decimal::ZERO);

        let position = Position::open(
            token_id.as_str(),
            snapshot.slug.as_str(),
            outcome.as_str(),
            decision.side,
            buy_price,
            shares,
            decision.position_size,
            decision.reasoning.as_str(),
        );

        let opened = match self.portfolio.open_position(position) {
            Ok(opened) => opened.clone(),
            Err(e @ PortfolioError::InsufficientCash { .. }) => {
                warn!("BUY dropped for {}: {}", snapshot.slug, e);
                return;
            }
            Err(e) => {
                error!("BUY failed for {}: {}", snapshot.slug, e);
                return;
            }
        };

        self.prices.insert(opened.token_id.clone(), buy_price);
        info!(
            "✅ BUY executed: {} @ {:.1}c ({:.0} shares, ${:.2})",
            opened.outcome,
            to_percent(buy_price),
            opened.shares,
            opened.cost_basis
        );

        if let Err(e) = self.recorder.record_position_opened(&opened).await {
            warn!("Failed to record opened position: {}", e);
        }
    }

    async fn execute_sell(&mut self, snapshot: &MarketSnapshot, existing: &Position) {
        let Some(quote) = snapshot.outcome(&existing.outcome) else {
            warn!("Outcome {} not in snapshot, skipping SELL", existing.outcome);
            return;
        };
        let sell_price = quote.sell_price;

        let closed = match self
            .portfolio
            .close_position(&existing.token_id, sell_price, Utc::now())
        {
            Ok(closed) => closed,
            Err(e) => {
                warn!("SELL failed for {}: {}", snapshot.slug, e);
                return;
            }
        };

        self.prices.remove(&closed.token_id);
        info!(
            "📤 SELL executed: {} @ {:.1}c (P&L: ${:.2})",
            closed.outcome,
            to_percent(sell_price),
            closed.pnl()
        );

        if let Err(e) = self.recorder.record_position_closed(&closed).await {
            warn!("Failed to record closed position: {}", e);
        }
    }

    fn report(&self, cycles: u64) -> SessionReport {
        let final_value = self.portfolio.get_total_value(Some(&self.prices));
        SessionReport {
            cycles,
            duration: self.config.duration,
            starting_capital: self.portfolio.starting_capital(),
            final_value,
            total_pnl: final_value - self.portfolio.starting_capital(),
            pnl_percent: self.portfolio.get_pnl_percent(Some(&self.prices)),
            realized_pnl: self.portfolio.get_realized_pnl(),
            unrealized_pnl: self.portfolio.get_unrealized_pnl(&self.prices),
            closed_positions: self.portfolio.closed_positions().len(),
            open_positions: self.portfolio.open_positions().len(),
        }
    }
}

fn log_decision(decision: &TradeDecision) {
    info!("    [DECISION] {}", decision.action);
    if decision.confidence > Decimal::ZERO {
        info!("       Outcome: {}", decision.outcome.as_deref().unwrap_or("N/A"));
        info!("       Size: ${:.2}", decision.position_size);
        info!("       Confidence: {:.0}%", to_percent(decision.confidence));
        if let Some(edge) = decision.edge {
            info!("       Edge: {:.1}%", edge);
        }
    }
    info!("       Reasoning: {}", decision.reasoning);
}
