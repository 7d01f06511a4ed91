//! End-to-end tests over the public API.
//!
//! Tests cover:
//! - Price data port to backtest result, including the pullback fixture
//! - Zero-trade boundaries (short history, saturated RSI)
//! - BUY and SELL entries for every built-in strategy, with each exit reason
//! - Equity curve bookkeeping
//! - Request boundary and result repositories
//! - Advisor request assembly and response validation

mod common;

use approx::assert_relative_eq;
use common::*;
use quantdash::adapters::memory_repository::MemoryRepository;
use quantdash::domain::advisor::{
    AdvisorRequest, AdvisorSignal, NewsEvent, SignalType, build_advisor_request, request_advice,
};
use quantdash::domain::backtest::{BacktestConfig, run_backtest, run_backtest_with_config};
use quantdash::domain::error::QuantError;
use quantdash::domain::execution::FillModel;
use quantdash::domain::metrics::Metrics;
use quantdash::domain::pattern::detect_patterns;
use quantdash::domain::position::{ExitReason, TradeOutcome};
use quantdash::domain::request::{BacktestRequest, run_and_store, run_request};
use quantdash::domain::snapshot::compute_indicators;
use quantdash::domain::strategy::{Side, StrategyId, StrategyRegistry};
use quantdash::ports::advisor_port::SignalAdvisor;
use quantdash::ports::price_data_port::PriceDataPort;
use quantdash::ports::result_port::ResultRepository;
use std::cell::RefCell;

mod backtest_pipeline {
    use super::*;

    #[test]
    fn pullback_through_data_port() {
        let port = MockPriceDataPort::new().with_bars("BTCUSD", bars_from_closes(&pullback_closes()));
        let series = port.fetch_series("BTCUSD").unwrap();
        assert_eq!(series.len(), 70);

        let result = run_backtest(&series, "trend_continuation", 1.0).unwrap();

        assert!(result.total_trades >= 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.entry_index, 52);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_eq!(trade.outcome, TradeOutcome::Win);
        assert_eq!(trade.entry_time, series[52].timestamp);
        assert_eq!(trade.exit_time, series[trade.exit_index].timestamp);
        assert_relative_eq!(trade.pnl, 200.0, epsilon = 1e-9);
        assert_relative_eq!(result.equity_curve[1], 10_200.0, epsilon = 1e-9);
    }

    #[test]
    fn monotonic_uptrend_saturates_rsi_and_never_trades() {
        let series = series_from_closes(&monotonic_closes(60));
        let snapshot = compute_indicators(&series).unwrap();
        assert_eq!(snapshot.rsi, 100.0);

        for id in StrategyId::ALL {
            let result = run_backtest(&series, id.as_str(), 1.0).unwrap();
            assert_eq!(result.total_trades, 0, "{id}");
            assert_eq!(result.equity_curve, vec![10_000.0]);
        }
    }

    #[test]
    fn short_history_is_not_an_error() {
        let series = series_from_closes(&monotonic_closes(10));
        let result = run_backtest(&series, "rsi_divergence", 2.0).unwrap();
        assert_eq!(result.total_trades, 0);
        assert_eq!(result.win_rate, 0.0);
        assert!(!result.win_rate.is_nan());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let series = series_from_closes(&pullback_closes());
        match run_backtest(&series, "golden_cross", 1.0) {
            Err(QuantError::StrategyNotFound { id }) => assert_eq!(id, "golden_cross"),
            other => panic!("expected StrategyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_bar_fails_at_the_port() {
        let mut bars = bars_from_closes(&pullback_closes());
        bars[10].high = bars[10].low - 1.0;
        let port = MockPriceDataPort::new().with_bars("BAD", bars);
        assert!(matches!(
            port.fetch_series("BAD"),
            Err(QuantError::InvalidBar { index: 10, .. })
        ));
    }

    #[test]
    fn port_errors_propagate() {
        let port = MockPriceDataPort::new().with_error("DOWN", "feed unavailable");
        assert!(matches!(
            port.fetch_series("DOWN"),
            Err(QuantError::DataSource { .. })
        ));
    }

    #[test]
    fn equity_curve_reflects_every_trade() {
        let config = BacktestConfig {
            warmup_bars: 20,
            cooldown_bars: 1,
            fill_model: FillModel::Synthetic {
                win_probability: 0.5,
                seed: Some(11),
            },
            ..BacktestConfig::default()
        };
        let strategy = StrategyRegistry::new().by_id(StrategyId::TrendContinuation);
        let result =
            run_backtest_with_config(&series_from_closes(&pullback_closes()), strategy, 1.0, &config)
                .unwrap();

        assert_eq!(result.equity_curve.len(), result.total_trades + 1);
        assert_eq!(result.equity_curve[0], 10_000.0);
        let mut equity = 10_000.0;
        for (trade, point) in result.trades.iter().zip(&result.equity_curve[1..]) {
            equity += trade.pnl;
            assert_relative_eq!(*point, equity, epsilon = 1e-9);
        }
        assert_relative_eq!(result.net_profit, equity - 10_000.0, epsilon = 1e-9);
    }

    #[test]
    fn metrics_agree_with_result() {
        let result =
            run_backtest(&series_from_closes(&pullback_closes()), "trend_continuation", 1.0)
                .unwrap();
        let metrics = Metrics::compute(&result, 10_000.0);

        assert_relative_eq!(
            metrics.total_return,
            result.net_profit / 10_000.0 * 100.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(metrics.max_drawdown, result.max_drawdown, epsilon = 1e-9);
        assert!(metrics.avg_bars_held >= 1.0);
    }
}

mod strategy_trades {
    use super::*;
    use quantdash::domain::backtest::BacktestResult;
    use quantdash::domain::position::Trade;

    fn only_trade(result: &BacktestResult) -> &Trade {
        assert_eq!(result.total_trades, 1, "{:?}", result.trades);
        &result.trades[0]
    }

    #[test]
    fn bb_mean_reversion_buys_lower_band_spike() {
        let series = series_from_closes(&lower_band_spike_closes());
        let result = run_backtest(&series, "bb_mean_reversion", 1.0).unwrap();
        let trade = only_trade(&result);

        assert_eq!(trade.entry_index, 60);
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.entry_price, 95.0);
        assert_eq!(trade.exit_index, 63);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        // ATR(14) = 19 / 14, target two ATRs above entry
        assert_relative_eq!(trade.exit_price, 95.0 + 2.0 * 19.0 / 14.0, epsilon = 1e-9);
        assert_relative_eq!(trade.pnl, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn bb_mean_reversion_sells_upper_band_spike() {
        let series = series_from_closes(&upper_band_spike_closes());
        let result = run_backtest(&series, "bb_mean_reversion", 1.0).unwrap();
        let trade = only_trade(&result);

        assert_eq!(trade.entry_index, 60);
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.exit_index, 63);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        // ATR(14) = 18 / 14, target two ATRs below entry
        assert_relative_eq!(trade.exit_price, 106.0 - 2.0 * 18.0 / 14.0, epsilon = 1e-9);
        assert!(trade.exit_price < trade.entry_price);
        assert_relative_eq!(trade.pnl, 200.0, epsilon = 1e-9);
        assert_eq!(trade.outcome, TradeOutcome::Win);
    }

    #[test]
    fn rsi_divergence_sells_overbought_bounce_below_sma50() {
        let closes = relief_rally_closes(|j| 159.5 - 2.0 * j as f64);
        let series = series_from_closes(&closes);
        let snapshot = compute_indicators(&series[..56]).unwrap();
        assert!(snapshot.rsi > 70.0);
        assert!(snapshot.close < snapshot.sma50);

        let result = run_backtest(&series, "rsi_divergence", 1.0).unwrap();
        let trade = only_trade(&result);

        assert_eq!(trade.entry_index, 55);
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.exit_index, 60);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        // ATR(14) = (12 * 0.5 + 0.5 + 54) / 14
        assert_relative_eq!(trade.exit_price, 159.5 - 2.0 * 60.5 / 14.0, epsilon = 1e-9);
        assert_relative_eq!(trade.pnl, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn rsi_divergence_buys_oversold_flush_above_sma50() {
        let series = series_from_closes(&flush_in_uptrend_closes());
        let result = run_backtest(&series, "rsi_divergence", 1.0).unwrap();
        let trade = only_trade(&result);

        assert_eq!(trade.entry_index, 55);
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.entry_price, 240.5);
        assert_eq!(trade.exit_index, 60);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_relative_eq!(trade.exit_price, 240.5 + 2.0 * 60.5 / 14.0, epsilon = 1e-9);
        assert_relative_eq!(trade.pnl, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn short_stopped_out_when_rally_continues() {
        let series = series_from_closes(&relief_rally_closes(|j| 159.5 + 2.0 * j as f64));
        let result = run_backtest(&series, "rsi_divergence", 1.0).unwrap();
        let trade = only_trade(&result);

        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.exit_index, 58);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_relative_eq!(trade.exit_price, 159.5 + 60.5 / 14.0, epsilon = 1e-9);
        assert!(trade.exit_price > trade.entry_price);
        assert_relative_eq!(trade.pnl, -100.0, epsilon = 1e-9);
        assert_eq!(trade.outcome, TradeOutcome::Loss);
        assert_relative_eq!(result.equity_curve[1], 9_900.0, epsilon = 1e-9);
    }

    #[test]
    fn short_marked_to_close_at_horizon() {
        let series = series_from_closes(&relief_rally_closes(|j| 159.5 - 0.5 * j as f64));
        let result = run_backtest(&series, "rsi_divergence", 1.0).unwrap();
        let trade = only_trade(&result);

        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.exit_index, 65);
        assert_eq!(trade.exit_reason, ExitReason::Horizon);
        assert_eq!(trade.exit_price, 154.5);
        // five points in the short's favour over a 60.5 / 14 stop distance
        assert_relative_eq!(trade.pnl, 100.0 * 5.0 / (60.5 / 14.0), epsilon = 1e-9);
        assert_eq!(trade.outcome, TradeOutcome::Win);
    }
}

mod request_boundary {
    use super::*;

    fn request(strategy_id: &str) -> BacktestRequest {
        BacktestRequest {
            symbol: "BTCUSD".to_string(),
            price_series: series_from_closes(&pullback_closes()),
            strategy_id: strategy_id.to_string(),
            risk_percent: 1.0,
        }
    }

    #[test]
    fn json_request_round_trip() {
        let json = serde_json::to_string(&request("trend_continuation")).unwrap();
        let parsed: BacktestRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request("trend_continuation"));

        let result = run_request(&parsed, &BacktestConfig::default()).unwrap();
        let out = serde_json::to_value(&result).unwrap();
        for field in [
            "totalTrades",
            "wins",
            "losses",
            "winRate",
            "netProfit",
            "maxDrawdown",
            "equityCurve",
            "trades",
        ] {
            assert!(out.get(field).is_some(), "missing {field}");
        }
        for field in ["entryTime", "exitTime", "side", "pnl", "outcome"] {
            assert!(out["trades"][0].get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn invalid_risk_rejected() {
        let mut req = request("trend_continuation");
        req.risk_percent = 0.0;
        assert!(matches!(
            run_request(&req, &BacktestConfig::default()),
            Err(QuantError::InvalidRisk { .. })
        ));
    }

    #[test]
    fn stored_results_are_keyed_by_session() {
        let repo = MemoryRepository::new();
        let config = BacktestConfig::default();

        let stored = run_and_store(&request("trend_continuation"), &config, &repo, "session-a")
            .unwrap();
        run_and_store(&request("rsi_divergence"), &config, &repo, "session-a").unwrap();

        let all = repo.get_all("session-a").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], stored);
        assert_eq!(all[1].strategy_id, StrategyId::RsiDivergence);
        assert!(repo.get_all("session-b").unwrap().is_empty());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_repository_matches_memory_repository() {
        use quantdash::adapters::sqlite_adapter::SqliteRepository;

        let sqlite = SqliteRepository::in_memory().unwrap();
        sqlite.initialize_schema().unwrap();
        let memory = MemoryRepository::new();
        let config = BacktestConfig::default();

        let a = run_and_store(&request("trend_continuation"), &config, &sqlite, "k").unwrap();
        let b = run_and_store(&request("trend_continuation"), &config, &memory, "k").unwrap();

        assert_eq!(a.result, b.result);
        assert_eq!(sqlite.get_all("k").unwrap()[0].result, memory.get_all("k").unwrap()[0].result);
    }
}

mod advisor_contract {
    use super::*;

    /// Records the last request and answers with a fixed signal.
    struct RecordingAdvisor {
        response: AdvisorSignal,
        seen: RefCell<Option<AdvisorRequest>>,
    }

    impl SignalAdvisor for RecordingAdvisor {
        fn advise(&self, request: &AdvisorRequest) -> Result<AdvisorSignal, QuantError> {
            *self.seen.borrow_mut() = Some(request.clone());
            Ok(self.response.clone())
        }
    }

    fn signal(signal_type: SignalType, entry: f64, sl: f64, tp: f64, confidence: f64) -> AdvisorSignal {
        AdvisorSignal {
            signal_type,
            entry,
            sl,
            tp,
            confidence,
            reasoning: "pullback in uptrend".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn advisor_receives_snapshot_patterns_and_news() {
        let series = series_from_closes(&pullback_closes());
        let patterns = detect_patterns(&series);
        let news = NewsEvent {
            title: "CPI release".to_string(),
            time: start_time(),
            impact: Some("high".to_string()),
        };
        let request = build_advisor_request(&series, &patterns, Some(news.clone())).unwrap();

        let advisor = RecordingAdvisor {
            response: signal(SignalType::Buy, 148.0, 145.0, 154.0, 72.0),
            seen: RefCell::new(None),
        };
        let accepted = request_advice(&advisor, &request).unwrap();
        assert_eq!(accepted.signal_type, SignalType::Buy);

        let seen = advisor.seen.borrow().clone().unwrap();
        assert_eq!(seen.indicator_snapshot.close, 148.0);
        assert_eq!(seen.pattern_events, patterns);
        assert_eq!(seen.next_news_event, Some(news));
    }

    #[test]
    fn inconsistent_signals_are_rejected() {
        let request =
            build_advisor_request(&series_from_closes(&pullback_closes()), &[], None).unwrap();

        for bad in [
            signal(SignalType::Buy, 148.0, 150.0, 154.0, 72.0),
            signal(SignalType::Sell, 148.0, 145.0, 140.0, 72.0),
            signal(SignalType::Hold, 0.0, 0.0, 0.0, 140.0),
        ] {
            let advisor = RecordingAdvisor {
                response: bad,
                seen: RefCell::new(None),
            };
            assert!(matches!(
                request_advice(&advisor, &request),
                Err(QuantError::InvalidAdvice { .. })
            ));
        }
    }
}
