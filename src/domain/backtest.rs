//! Backtest engine.
//!
//! Replays a validated [`PriceSeries`] against one strategy. Indicators are
//! computed once up front; the walk then evaluates the strategy bar by bar
//! from the warm-up offset to `len - exit_horizon`, opening at most one
//! position at a time.

use super::error::QuantError;
use super::execution::{FillModel, Simulator, close_trade};
use super::metrics::max_drawdown_pct;
use super::portfolio::Account;
use super::position::{OpenPosition, Trade};
use super::price_series::PriceSeries;
use super::snapshot::IndicatorFrame;
use super::strategy::{Strategy, StrategyRegistry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_equity: f64,
    /// First bar the strategy is evaluated on.
    pub warmup_bars: usize,
    /// Bars a position may be held before it is closed at market.
    pub exit_horizon: usize,
    /// Minimum bars between consecutive entries.
    pub cooldown_bars: usize,
    pub reward_risk: f64,
    /// Stop distance in multiples of ATR(14) at entry.
    pub stop_atr_multiple: f64,
    /// Stop distance in percent of entry when ATR is zero.
    pub fallback_stop_pct: f64,
    pub fill_model: FillModel,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_equity: 10_000.0,
            warmup_bars: 50,
            exit_horizon: 10,
            cooldown_bars: 5,
            reward_risk: 2.0,
            stop_atr_multiple: 1.0,
            fallback_stop_pct: 1.0,
            fill_model: FillModel::PriceDriven,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), QuantError> {
        if !(self.initial_equity.is_finite() && self.initial_equity > 0.0) {
            return Err(QuantError::config_invalid(
                "backtest",
                "initial_equity",
                format!("must be positive, got {}", self.initial_equity),
            ));
        }
        if self.exit_horizon == 0 {
            return Err(QuantError::config_invalid(
                "backtest",
                "exit_horizon",
                "must be at least 1",
            ));
        }
        if !(self.reward_risk.is_finite() && self.reward_risk > 0.0) {
            return Err(QuantError::config_invalid(
                "backtest",
                "reward_risk",
                format!("must be positive, got {}", self.reward_risk),
            ));
        }
        if !(self.stop_atr_multiple.is_finite() && self.stop_atr_multiple > 0.0) {
            return Err(QuantError::config_invalid(
                "backtest",
                "stop_atr_multiple",
                format!("must be positive, got {}", self.stop_atr_multiple),
            ));
        }
        if !(self.fallback_stop_pct > 0.0 && self.fallback_stop_pct < 100.0) {
            return Err(QuantError::config_invalid(
                "backtest",
                "fallback_stop_pct",
                format!("must be within (0, 100), got {}", self.fallback_stop_pct),
            ));
        }
        if let FillModel::Synthetic {
            win_probability, ..
        } = self.fill_model
        {
            if !(0.0..=1.0).contains(&win_probability) {
                return Err(QuantError::config_invalid(
                    "fill",
                    "win_probability",
                    format!("must be within [0, 1], got {win_probability}"),
                ));
            }
        }
        Ok(())
    }

    fn stop_distance(&self, entry_price: f64, atr: f64) -> f64 {
        if atr > 0.0 {
            atr * self.stop_atr_multiple
        } else {
            tracing::warn!(
                entry_price,
                fallback_pct = self.fallback_stop_pct,
                "ATR is zero, using percentage stop"
            );
            entry_price * self.fallback_stop_pct / 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent of trades that made money; 0 when there were none.
    pub win_rate: f64,
    pub net_profit: f64,
    /// Largest peak-to-trough decline of the equity curve, in percent.
    pub max_drawdown: f64,
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    fn from_account(account: Account) -> Self {
        let total_trades = account.trades.len();
        let wins = account.wins();
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };
        BacktestResult {
            total_trades,
            wins,
            losses: total_trades - wins,
            win_rate,
            net_profit: account.net_profit(),
            max_drawdown: max_drawdown_pct(&account.equity_curve),
            equity_curve: account.equity_curve,
            trades: account.trades,
        }
    }

    pub fn initial_equity(&self) -> Option<f64> {
        self.equity_curve.first().copied()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.equity_curve.last().copied()
    }
}

pub fn validate_risk(risk_pct: f64) -> Result<(), QuantError> {
    if risk_pct.is_finite() && risk_pct > 0.0 && risk_pct <= 100.0 {
        Ok(())
    } else {
        Err(QuantError::InvalidRisk { value: risk_pct })
    }
}

/// Runs `strategy_id` over `series` with the default configuration.
pub fn run_backtest(
    series: &PriceSeries,
    strategy_id: &str,
    risk_pct: f64,
) -> Result<BacktestResult, QuantError> {
    let strategy = StrategyRegistry::new().get(strategy_id)?;
    run_backtest_with_config(series, strategy, risk_pct, &BacktestConfig::default())
}

pub fn run_backtest_with_config(
    series: &PriceSeries,
    strategy: &Strategy,
    risk_pct: f64,
    config: &BacktestConfig,
) -> Result<BacktestResult, QuantError> {
    validate_risk(risk_pct)?;
    config.validate()?;

    let bars = series.bars();
    let mut account = Account::new(config.initial_equity);
    let end = bars.len().saturating_sub(config.exit_horizon);

    tracing::debug!(
        strategy = %strategy.id,
        bars = bars.len(),
        risk_pct,
        fill = config.fill_model.name(),
        "backtest started"
    );

    if config.warmup_bars >= end {
        tracing::debug!(
            bars = bars.len(),
            warmup = config.warmup_bars,
            "series too short for warm-up, no trades"
        );
        return Ok(BacktestResult::from_account(account));
    }

    let frame = IndicatorFrame::compute(bars);
    let mut simulator = Simulator::new(&config.fill_model);

    let mut i = config.warmup_bars;
    while i < end {
        let Some(snapshot) = frame.snapshot_at(i) else {
            break;
        };
        let Some(side) = strategy.evaluate(i, &snapshot) else {
            i += 1;
            continue;
        };

        if account.equity <= 0.0 {
            tracing::warn!(index = i, "account depleted, stopping walk");
            break;
        }

        let bar = &bars[i];
        let position = OpenPosition::open(
            side,
            i,
            bar,
            config.stop_distance(bar.close, snapshot.atr),
            config.reward_risk,
            account.risk_amount(risk_pct),
        );
        let exit = simulator.exit(bars, &position, config.exit_horizon);
        let trade = close_trade(bars, &position, &exit);

        tracing::debug!(
            entry_index = trade.entry_index,
            exit_index = trade.exit_index,
            side = %trade.side,
            pnl = trade.pnl,
            reason = ?trade.exit_reason,
            "trade closed"
        );

        account.record_trade(trade);
        i = (i + config.cooldown_bars).max(exit.index + 1);
    }

    let result = BacktestResult::from_account(account);
    tracing::info!(
        strategy = %strategy.id,
        trades = result.total_trades,
        win_rate = result.win_rate,
        net_profit = result.net_profit,
        "backtest finished"
    );
    Ok(result)
}
