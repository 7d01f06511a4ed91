//! Open positions and closed trades.

use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A position between its entry bar and its exit.
///
/// Stop and target sit `stop_distance` and `reward_risk × stop_distance`
/// away from the entry, on the losing and winning side respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub side: Side,
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub stop_distance: f64,
    pub risk_amount: f64,
    pub reward_risk: f64,
}

impl OpenPosition {
    pub fn open(
        side: Side,
        entry_index: usize,
        bar: &PriceBar,
        stop_distance: f64,
        reward_risk: f64,
        risk_amount: f64,
    ) -> Self {
        let dir = side.direction();
        OpenPosition {
            side,
            entry_index,
            entry_time: bar.timestamp,
            entry_price: bar.close,
            stop_loss: bar.close - dir * stop_distance,
            take_profit: bar.close + dir * reward_risk * stop_distance,
            stop_distance,
            risk_amount,
            reward_risk,
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn should_stop_loss(&self, bar: &PriceBar) -> bool {
        if self.is_long() {
            bar.low <= self.stop_loss
        } else {
            bar.high >= self.stop_loss
        }
    }

    pub fn should_take_profit(&self, bar: &PriceBar) -> bool {
        if self.is_long() {
            bar.high >= self.take_profit
        } else {
            bar.low <= self.take_profit
        }
    }

    /// Profit in account currency if closed at `price`, scaled so a move of
    /// one stop distance against the position loses `risk_amount`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        self.risk_amount * self.side.direction() * (price - self.entry_price) / self.stop_distance
    }

    pub fn loss_amount(&self) -> f64 {
        -self.risk_amount
    }

    pub fn reward_amount(&self) -> f64 {
        self.reward_risk * self.risk_amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOutcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Horizon,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub side: Side,
    pub pnl: f64,
    pub outcome: TradeOutcome,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn is_win(&self) -> bool {
        self.outcome == TradeOutcome::Win
    }
}
