//! Trade exit simulation.
//!
//! Two fill models close an [`OpenPosition`]:
//! - `PriceDriven`: walks the bars after entry and exits at the first stop or
//!   target touch, or at the close of the last bar in the exit horizon. When a
//!   single bar touches both levels the stop is assumed to fill first.
//! - `Synthetic`: draws WIN/LOSS from a fixed win probability and pays the
//!   target or stop amount. Prices are not consulted, so it measures how a
//!   strategy's signal frequency compounds under an assumed edge rather than
//!   how the signals actually performed.

use crate::domain::ohlcv::PriceBar;
use crate::domain::position::{ExitReason, OpenPosition, Trade, TradeOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub enum FillModel {
    PriceDriven,
    Synthetic {
        win_probability: f64,
        /// Fixed seed for reproducible runs; entropy-seeded when absent.
        seed: Option<u64>,
    },
}

impl Default for FillModel {
    fn default() -> Self {
        FillModel::PriceDriven
    }
}

impl FillModel {
    pub const DEFAULT_WIN_PROBABILITY: f64 = 0.8;

    pub fn name(&self) -> &'static str {
        match self {
            FillModel::PriceDriven => "price",
            FillModel::Synthetic { .. } => "synthetic",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exit {
    pub index: usize,
    pub price: f64,
    pub pnl: f64,
    pub reason: ExitReason,
}

/// Per-run exit simulator; owns the random source for the synthetic model.
pub struct Simulator {
    model: FillModel,
    rng: Option<StdRng>,
}

impl Simulator {
    pub fn new(model: &FillModel) -> Self {
        let rng = match model {
            FillModel::PriceDriven => None,
            FillModel::Synthetic {
                seed: Some(seed), ..
            } => Some(StdRng::seed_from_u64(*seed)),
            FillModel::Synthetic { seed: None, .. } => Some(StdRng::from_entropy()),
        };
        Simulator {
            model: model.clone(),
            rng,
        }
    }

    pub fn exit(&mut self, bars: &[PriceBar], position: &OpenPosition, horizon: usize) -> Exit {
        match (&self.model, self.rng.as_mut()) {
            (FillModel::Synthetic { win_probability, .. }, Some(rng)) => {
                synthetic_exit(rng, bars, position, horizon, *win_probability)
            }
            _ => price_driven_exit(bars, position, horizon),
        }
    }
}

/// Last bar index a position opened at `entry_index` may be held to.
fn horizon_index(bars: &[PriceBar], entry_index: usize, horizon: usize) -> usize {
    (entry_index + horizon).min(bars.len().saturating_sub(1))
}

pub fn price_driven_exit(bars: &[PriceBar], position: &OpenPosition, horizon: usize) -> Exit {
    let last = horizon_index(bars, position.entry_index, horizon);

    for (index, bar) in bars.iter().enumerate().take(last + 1).skip(position.entry_index + 1) {
        if position.should_stop_loss(bar) {
            return Exit {
                index,
                price: position.stop_loss,
                pnl: position.loss_amount(),
                reason: ExitReason::StopLoss,
            };
        }
        if position.should_take_profit(bar) {
            return Exit {
                index,
                price: position.take_profit,
                pnl: position.reward_amount(),
                reason: ExitReason::TakeProfit,
            };
        }
    }

    let price = bars.get(last).map_or(position.entry_price, |b| b.close);
    Exit {
        index: last.max(position.entry_index),
        price,
        pnl: position.pnl_at(price),
        reason: ExitReason::Horizon,
    }
}

pub fn synthetic_exit<R: Rng>(
    rng: &mut R,
    bars: &[PriceBar],
    position: &OpenPosition,
    horizon: usize,
    win_probability: f64,
) -> Exit {
    let index = horizon_index(bars, position.entry_index, horizon).max(position.entry_index);
    if rng.gen_bool(win_probability) {
        Exit {
            index,
            price: position.take_profit,
            pnl: position.reward_amount(),
            reason: ExitReason::Synthetic,
        }
    } else {
        Exit {
            index,
            price: position.stop_loss,
            pnl: position.loss_amount(),
            reason: ExitReason::Synthetic,
        }
    }
}

/// Closes `position` with `exit`; a trade is a win only if it made money.
pub fn close_trade(bars: &[PriceBar], position: &OpenPosition, exit: &Exit) -> Trade {
    Trade {
        entry_time: position.entry_time,
        exit_time: bars
            .get(exit.index)
            .map_or(position.entry_time, |b| b.timestamp),
        side: position.side,
        pnl: exit.pnl,
        outcome: if exit.pnl > 0.0 {
            TradeOutcome::Win
        } else {
            TradeOutcome::Loss
        },
        entry_index: position.entry_index,
        exit_index: exit.index,
        entry_price: position.entry_price,
        exit_price: exit.price,
        exit_reason: exit.reason,
    }
}
