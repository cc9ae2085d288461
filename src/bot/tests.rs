//! Tests for the trading loop

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::BotError;
    use crate::types::{OutcomeQuote, PortfolioSummary, PositionSide};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const SLUG: &str = "eng-v-ind";

    /// Provider serving snapshots from a shared map
    #[derive(Clone, Default)]
    struct FakeProvider {
        slugs: Arc<Mutex<Option<Vec<String>>>>,
        snapshots: Arc<Mutex<HashMap<String, MarketSnapshot>>>,
    }

    impl FakeProvider {
        fn with_market(snapshot: MarketSnapshot) -> Self {
            let provider = Self::default();
            provider.set_slugs(vec![snapshot.slug.clone()]);
            provider.set_snapshot(snapshot);
            provider
        }

        fn set_slugs(&self, slugs: Vec<String>) {
            *self.slugs.lock().unwrap() = Some(slugs);
        }

        fn fail_scan(&self) {
            *self.slugs.lock().unwrap() = None;
        }

        fn set_snapshot(&self, snapshot: MarketSnapshot) {
            self.snapshots
                .lock()
                .unwrap()
                .insert(snapshot.slug.clone(), snapshot);
        }
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        async fn scan(&self, _min_volume: Decimal) -> Result<Vec<String>> {
            self.slugs
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| BotError::Api("gamma unavailable".to_string()))
        }

        async fn collect(&self, market_id: &str) -> Result<MarketSnapshot> {
            self.snapshots
                .lock()
                .unwrap()
                .get(market_id)
                .cloned()
                .ok_or_else(|| BotError::MarketNotFound(market_id.to_string()))
        }
    }

    /// Strategy replaying queued decisions, PASS once exhausted
    #[derive(Clone, Default)]
    struct ScriptedStrategy {
        decisions: Arc<Mutex<VecDeque<TradeDecision>>>,
        seen: Arc<Mutex<Vec<(String, PortfolioSummary, Option<String>)>>>,
    }

    impl ScriptedStrategy {
        fn push(&self, decision: TradeDecision) {
            self.decisions.lock().unwrap().push_back(decision);
        }

        fn calls(&self) -> Vec<(String, PortfolioSummary, Option<String>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Strategy for ScriptedStrategy {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn analyze(
            &self,
            snapshot: &MarketSnapshot,
            summary: &PortfolioSummary,
            existing: Option<&Position>,
        ) -> TradeDecision {
            self.seen.lock().unwrap().push((
                snapshot.slug.clone(),
                *summary,
                existing.map(|p| p.outcome.clone()),
            ));
            self.decisions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| TradeDecision::pass("nothing queued"))
        }
    }

    #[derive(Clone, Default)]
    struct MemoryRecorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl MemoryRecorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.events().iter().filter(|e| e.starts_with(prefix)).count()
        }
    }

    #[async_trait]
    impl Recorder for MemoryRecorder {
        async fn record_portfolio_state(&self, state: &PortfolioStateRecord) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("state cash={}", state.cash));
            Ok(())
        }

        async fn record_decision(&self, decision: &DecisionRecord) -> Result<()> {
            self.events.lock().unwrap().push(format!(
                "decision {} {} cycle={}",
                decision.match_slug, decision.action, decision.cycle
            ));
            Ok(())
        }

        async fn record_position_opened(&self, position: &Position) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("opened {}", position.token_id));
            Ok(())
        }

        async fn record_position_closed(&self, position: &Position) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("closed {} pnl={}", position.token_id, position.pnl()));
            Ok(())
        }
    }

    struct Harness {
        provider: FakeProvider,
        strategy: ScriptedStrategy,
        recorder: MemoryRecorder,
        bot: BotLoop,
    }

    fn harness(provider: FakeProvider, capital: Decimal, config: BotConfig) -> Harness {
        let strategy = ScriptedStrategy::default();
        let recorder = MemoryRecorder::default();
        let bot = BotLoop::new(
            Box::new(provider.clone()),
            Box::new(strategy.clone()),
            Box::new(recorder.clone()),
            capital,
            config,
        );
        Harness {
            provider,
            strategy,
            recorder,
            bot,
        }
    }

    fn make_snapshot(eng_buy: Decimal, eng_sell: Decimal) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::new(SLUG);
        snapshot.title = "England vs India".to_string();
        snapshot.volume = dec!(20000);
        snapshot.insert_outcome("England", OutcomeQuote::new("tok-eng", eng_buy, eng_sell));
        snapshot.insert_outcome("India", OutcomeQuote::new("tok-ind", dec!(0.45), dec!(0.44)));
        snapshot
    }

    fn buy(outcome: &str, token: &str, size: Decimal) -> TradeDecision {
        TradeDecision {
            action: TradeAction::Buy,
            token_id: Some(token.to_string()),
            outcome: Some(outcome.to_string()),
            side: PositionSide::Yes,
            position_size: size,
            confidence: dec!(0.8),
            edge: Some(dec!(4)),
            reasoning: "value".to_string(),
            metadata: HashMap::new(),
        }
    }

    fn sell() -> TradeDecision {
        TradeDecision {
            action: TradeAction::Sell,
            confidence: dec!(0.7),
            ..TradeDecision::pass("take profit")
        }
    }

    fn default_harness() -> Harness {
        harness(
            FakeProvider::with_market(make_snapshot(dec!(0.5), dec!(0.48))),
            dec!(1000),
            BotConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_buy_opens_position_and_caches_price() {
        let mut h = default_harness();
        h.strategy.push(buy("England", "tok-eng", dec!(50)));

        assert_eq!(h.bot.run_cycle(1).await, 1);

        let portfolio = h.bot.portfolio();
        assert_eq!(portfolio.current_cash(), dec!(950));
        assert_eq!(portfolio.open_positions().len(), 1);
        let pos = &portfolio.open_positions()[0];
        assert_eq!(pos.shares, dec!(100));
        assert_eq!(pos.entry_price, dec!(0.5));
        assert_eq!(pos.market_id, SLUG);
        assert_eq!(h.bot.prices().get("tok-eng"), Some(&dec!(0.5)));

        assert_eq!(
            h.recorder.events(),
            vec![
                format!("decision {} BUY cycle=1", SLUG),
                "opened tok-eng".to_string(),
                "state cash=950".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_buy_is_skipped() {
        let mut h = default_harness();
        h.strategy.push(buy("England", "tok-eng", dec!(50)));
        h.strategy.push(buy("India", "tok-ind", dec!(30)));

        h.bot.run_cycle(1).await;
        h.bot.run_cycle(2).await;

        assert_eq!(h.bot.portfolio().open_positions().len(), 1);
        assert_eq!(h.bot.portfolio().current_cash(), dec!(950));
        assert_eq!(h.recorder.count("opened"), 1);
        assert_eq!(h.recorder.count("decision"), 2);
    }

    #[tokio::test]
    async fn test_buy_for_unquoted_outcome_is_noop() {
        let mut h = default_harness();
        h.strategy.push(buy("Australia", "tok-aus", dec!(50)));

        h.bot.run_cycle(1).await;

        assert!(h.bot.portfolio().open_positions().is_empty());
        assert_eq!(h.bot.portfolio().current_cash(), dec!(1000));
        assert!(h.bot.prices().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_buy_is_noop() {
        let mut h = default_harness();
        let mut decision = buy("Australia", "tok-aus", dec!(50));
        decision.token_id = None;
        h.strategy.push(decision);

        h.bot.run_cycle(1).await;
        assert!(h.bot.portfolio().open_positions().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_size_is_skipped() {
        let mut h = default_harness();
        h.strategy.push(buy("England", "tok-eng", Decimal::ZERO));

        h.bot.run_cycle(1).await;
        assert!(h.bot.portfolio().open_positions().is_empty());
        assert_eq!(h.bot.portfolio().current_cash(), dec!(1000));
    }

    #[tokio::test]
    async fn test_insolvent_buy_is_dropped() {
        let mut h = harness(
            FakeProvider::with_market(make_snapshot(dec!(0.5), dec!(0.48))),
            dec!(40),
            BotConfig::default(),
        );
        h.strategy.push(buy("England", "tok-eng", dec!(50)));

        h.bot.run_cycle(1).await;

        assert!(h.bot.portfolio().open_positions().is_empty());
        assert_eq!(h.bot.portfolio().current_cash(), dec!(40));
        assert_eq!(h.recorder.count("opened"), 0);
    }

    #[tokio::test]
    async fn test_zero_buy_price_opens_with_no_shares() {
        let mut h = harness(
            FakeProvider::with_market(make_snapshot(Decimal::ZERO, Decimal::ZERO)),
            dec!(1000),
            BotConfig::default(),
        );
        h.strategy.push(buy("England", "tok-eng", dec!(25)));

        h.bot.run_cycle(1).await;

        let pos = &h.bot.portfolio().open_positions()[0];
        assert_eq!(pos.shares, Decimal::ZERO);
        assert_eq!(h.bot.portfolio().current_cash(), dec!(975));
    }

    #[tokio::test]
    async fn test_sell_closes_at_sell_price() {
        let mut h = default_harness();
        h.strategy.push(buy("England", "tok-eng", dec!(50)));
        h.bot.run_cycle(1).await;

        h.provider.set_snapshot(make_snapshot(dec!(0.62), dec!(0.6)));
        h.strategy.push(sell());
        h.bot.run_cycle(2).await;

        let portfolio = h.bot.portfolio();
        assert!(portfolio.open_positions().is_empty());
        assert_eq!(portfolio.closed_positions().len(), 1);
        assert_eq!(portfolio.closed_positions()[0].exit_price, Some(dec!(0.6)));
        // 950 + 0.6 * 100
        assert_eq!(portfolio.current_cash(), dec!(1010));
        assert_eq!(portfolio.get_realized_pnl(), dec!(10));
        assert!(h.bot.prices().is_empty());
        assert_eq!(h.recorder.count("closed tok-eng"), 1);
    }

    #[tokio::test]
    async fn test_sell_without_position_is_noop() {
        let mut h = default_harness();
        h.strategy.push(sell());

        h.bot.run_cycle(1).await;

        assert_eq!(h.bot.portfolio().current_cash(), dec!(1000));
        assert!(h.bot.portfolio().closed_positions().is_empty());
    }

    #[tokio::test]
    async fn test_sell_with_stale_outcome_keeps_position() {
        let mut h = default_harness();
        h.strategy.push(buy("England", "tok-eng", dec!(50)));
        h.bot.run_cycle(1).await;

        let mut renamed = MarketSnapshot::new(SLUG);
        renamed.insert_outcome("ENG", OutcomeQuote::new("tok-eng", dec!(0.7), dec!(0.7)));
        h.provider.set_snapshot(renamed);
        h.strategy.push(sell());
        h.bot.run_cycle(2).await;

        assert_eq!(h.bot.portfolio().open_positions().len(), 1);
        assert_eq!(h.bot.portfolio().current_cash(), dec!(950));
        // Cache keeps the last known price
        assert_eq!(h.bot.prices().get("tok-eng"), Some(&dec!(0.5)));
    }

    #[tokio::test]
    async fn test_existing_position_repriced_and_passed_to_strategy() {
        let mut h = default_harness();
        h.strategy.push(buy("England", "tok-eng", dec!(50)));
        h.bot.run_cycle(1).await;

        h.provider.set_snapshot(make_snapshot(dec!(0.7), dec!(0.68)));
        h.bot.run_cycle(2).await;

        assert_eq!(h.bot.prices().get("tok-eng"), Some(&dec!(0.7)));

        let calls = h.strategy.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].2, None);
        let (_, summary, existing) = &calls[1];
        assert_eq!(existing.as_deref(), Some("England"));
        assert_eq!(summary.current_cash, dec!(950));
        assert_eq!(summary.open_positions, 1);
        // 950 + 0.7 * 100
        assert_eq!(summary.total_value, dec!(1020));
    }

    #[tokio::test]
    async fn test_scan_failure_processes_nothing() {
        let mut h = default_harness();
        h.provider.fail_scan();

        assert_eq!(h.bot.run_cycle(1).await, 0);
        assert!(h.strategy.calls().is_empty());
        assert_eq!(h.recorder.events(), vec!["state cash=1000".to_string()]);
    }

    #[tokio::test]
    async fn test_collect_failure_does_not_stop_next_market() {
        let mut h = default_harness();
        h.provider
            .set_slugs(vec!["missing-market".to_string(), SLUG.to_string()]);
        h.strategy.push(buy("England", "tok-eng", dec!(50)));

        assert_eq!(h.bot.run_cycle(1).await, 2);

        assert_eq!(h.strategy.calls().len(), 1);
        assert_eq!(h.bot.portfolio().open_positions().len(), 1);
    }

    #[tokio::test]
    async fn test_extreme_decision_values_are_logged_safely() {
        // Formatting args are only evaluated with a subscriber installed
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt().with_test_writer().finish(),
        );
        let mut h = default_harness();
        h.strategy.push(TradeDecision {
            action: TradeAction::Hold,
            confidence: Decimal::MAX,
            edge: Some(Decimal::MIN),
            ..TradeDecision::pass("sure thing")
        });
        h.strategy.push(TradeDecision {
            confidence: Decimal::MIN,
            ..buy("England", "tok-eng", dec!(50))
        });

        h.bot.process_market(SLUG, 1).await;
        h.bot.process_market(SLUG, 1).await;

        assert_eq!(h.recorder.count("decision"), 2);
        assert_eq!(h.bot.portfolio().open_positions().len(), 1);
    }

    #[tokio::test]
    async fn test_every_decision_is_recorded() {
        let mut h = default_harness();
        h.bot.run_cycle(3).await;
        assert_eq!(
            h.recorder.events()[0],
            format!("decision {} PASS cycle=3", SLUG)
        );
    }

    #[tokio::test]
    async fn test_analyze_market_does_not_trade() {
        let h = default_harness();
        h.strategy.push(buy("England", "tok-eng", dec!(50)));

        let (snapshot, decision) = h.bot.analyze_market(SLUG).await.unwrap();
        assert_eq!(snapshot.title, "England vs India");
        assert_eq!(decision.action, TradeAction::Buy);
        assert!(h.bot.portfolio().open_positions().is_empty());
        assert!(h.recorder.events().is_empty());

        assert!(h.bot.analyze_market("missing-market").await.is_err());
    }

    #[tokio::test]
    async fn test_run_zero_duration_reports_without_cycles() {
        let config = BotConfig {
            duration: Duration::ZERO,
            ..BotConfig::default()
        };
        let mut h = harness(FakeProvider::default(), dec!(1000), config);

        let report = h.bot.run().await;
        assert_eq!(report.cycles, 0);
        assert_eq!(report.final_value, dec!(1000));
        assert_eq!(report.total_pnl, Decimal::ZERO);
        assert_eq!(report.pnl_percent, Decimal::ZERO);
        assert!(h.strategy.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_single_cycle_report() {
        let config = BotConfig {
            min_volume: dec!(5000),
            duration: Duration::from_millis(20),
            interval: Duration::from_millis(80),
        };
        let mut h = harness(
            FakeProvider::with_market(make_snapshot(dec!(0.5), dec!(0.48))),
            dec!(1000),
            config,
        );
        h.strategy.push(buy("England", "tok-eng", dec!(100)));

        let report = h.bot.run().await;

        assert_eq!(report.cycles, 1);
        assert_eq!(report.duration, Duration::from_millis(20));
        assert_eq!(report.starting_capital, dec!(1000));
        assert_eq!(report.final_value, dec!(1000));
        assert_eq!(report.unrealized_pnl, Decimal::ZERO);
        assert_eq!(report.open_positions, 1);
        assert_eq!(report.closed_positions, 0);
    }

    #[test]
    fn test_bot_config_from_config() {
        let mut config = Config::default();
        config.markets.min_volume = dec!(10000);
        config.run.duration_hours = 0.5;
        config.run.interval_minutes = 1.0;

        let bot_config = BotConfig::from_config(&config);
        assert_eq!(bot_config.min_volume, dec!(10000));
        assert_eq!(bot_config.duration, Duration::from_secs(1800));
        assert_eq!(bot_config.interval, Duration::from_secs(60));
    }
}
