//! Performance statistics over a finished backtest.

use super::backtest::BacktestResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Percent change from the initial to the final equity.
    pub total_return: f64,
    pub max_drawdown: f64,
    /// Longest run of equity points below the running peak.
    pub max_drawdown_duration: usize,
    /// Gross profit over gross loss. `None` (JSON `null`) when there are
    /// winning trades and no losses; `Some(0.0)` when there are no wins.
    pub profit_factor: Option<f64>,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Mean pnl per trade.
    pub expectancy: f64,
    pub avg_bars_held: f64,
    pub max_consecutive_losses: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, initial_equity: f64) -> Self {
        let final_equity = result.final_equity().unwrap_or(initial_equity);
        let total_return = if initial_equity > 0.0 {
            (final_equity - initial_equity) / initial_equity * 100.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&result.equity_curve);

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_bars = 0usize;
        let mut losing_streak = 0usize;
        let mut max_consecutive_losses = 0usize;

        for trade in &result.trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                wins += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
                losing_streak = 0;
            } else {
                if pnl < 0.0 {
                    losses += 1;
                    total_losses += pnl.abs();
                    largest_loss = largest_loss.max(pnl.abs());
                }
                losing_streak += 1;
                max_consecutive_losses = max_consecutive_losses.max(losing_streak);
            }
            total_bars += trade.bars_held();
        }

        let total_trades = result.trades.len();

        let profit_factor = if total_losses > 0.0 {
            Some(total_wins / total_losses)
        } else if total_wins > 0.0 {
            None
        } else {
            Some(0.0)
        };

        let avg_win = if wins > 0 {
            total_wins / wins as f64
        } else {
            0.0
        };

        let avg_loss = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };

        let (expectancy, avg_bars_held) = if total_trades > 0 {
            (
                (total_wins - total_losses) / total_trades as f64,
                total_bars as f64 / total_trades as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Metrics {
            total_return,
            max_drawdown,
            max_drawdown_duration,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            expectancy,
            avg_bars_held,
            max_consecutive_losses,
        }
    }
}

/// Largest peak-to-trough decline in percent of the running peak.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    compute_drawdown(equity_curve).0
}

fn compute_drawdown(equity_curve: &[f64]) -> (f64, usize) {
    let Some(&first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for &equity in equity_curve {
        if equity >= peak {
            peak = equity;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak * 100.0);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}
