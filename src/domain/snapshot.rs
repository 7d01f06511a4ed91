//! Indicator snapshots shared by the backtester and the advisor adapter.
//!
//! [`IndicatorFrame`] computes every indicator once over a series;
//! [`IndicatorFrame::snapshot_at`] then reads a point-in-time view in O(1).
//! Snapshots are recomputed on demand and never stored by the core.

use crate::domain::indicator::{
    bollinger, calculate_atr, calculate_bollinger, calculate_macd_default, calculate_rsi,
    calculate_sma, rsi, IndicatorSeries, IndicatorValue, NEUTRAL_RSI,
};
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdSnapshot {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

/// Indicator state at one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: f64,
    pub rsi: f64,
    pub macd: MacdSnapshot,
    pub bollinger: BollingerSnapshot,
    pub atr: f64,
}

/// All indicator series for one price history, aligned bar for bar.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    closes: Vec<f64>,
    timestamps: Vec<NaiveDateTime>,
    sma20: Vec<f64>,
    sma50: Vec<f64>,
    sma200: Vec<f64>,
    rsi: Vec<f64>,
    macd: Vec<MacdSnapshot>,
    bollinger: Vec<BollingerSnapshot>,
    atr: Vec<f64>,
}

impl IndicatorFrame {
    pub fn compute(bars: &[PriceBar]) -> Self {
        IndicatorFrame {
            closes: bars.iter().map(|b| b.close).collect(),
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            sma20: calculate_sma(bars, 20).simple_values(),
            sma50: calculate_sma(bars, 50).simple_values(),
            sma200: calculate_sma(bars, 200).simple_values(),
            rsi: rsi_values(&calculate_rsi(bars, rsi::DEFAULT_PERIOD)),
            macd: macd_values(&calculate_macd_default(bars)),
            bollinger: bollinger_values(&calculate_bollinger(
                bars,
                bollinger::DEFAULT_PERIOD,
                bollinger::DEFAULT_MULT_X100,
            )),
            atr: calculate_atr(bars, crate::domain::indicator::atr::DEFAULT_PERIOD)
                .simple_values(),
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Snapshot at `index`; `None` past the end of the series.
    pub fn snapshot_at(&self, index: usize) -> Option<IndicatorSnapshot> {
        if index >= self.len() {
            return None;
        }
        Some(IndicatorSnapshot {
            timestamp: self.timestamps[index],
            close: self.closes[index],
            sma20: self.sma20[index],
            sma50: self.sma50[index],
            sma200: self.sma200[index],
            rsi: self.rsi[index],
            macd: self.macd[index],
            bollinger: self.bollinger[index],
            atr: self.atr[index],
        })
    }

    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.snapshot_at(i))
    }
}

/// Indicator state at the most recent bar of `bars`, or `None` when empty.
pub fn compute_indicators(bars: &[PriceBar]) -> Option<IndicatorSnapshot> {
    IndicatorFrame::compute(bars).latest()
}

fn rsi_values(series: &IndicatorSeries) -> Vec<f64> {
    series
        .values
        .iter()
        .map(|p| match p.value {
            IndicatorValue::Simple(v) => v,
            _ => NEUTRAL_RSI,
        })
        .collect()
}

fn macd_values(series: &IndicatorSeries) -> Vec<MacdSnapshot> {
    series
        .values
        .iter()
        .map(|p| match p.value {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => MacdSnapshot {
                line,
                signal,
                histogram,
            },
            _ => MacdSnapshot {
                line: 0.0,
                signal: 0.0,
                histogram: 0.0,
            },
        })
        .collect()
}

fn bollinger_values(series: &IndicatorSeries) -> Vec<BollingerSnapshot> {
    series
        .values
        .iter()
        .map(|p| match p.value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => BollingerSnapshot {
                upper,
                mid: middle,
                lower,
            },
            _ => BollingerSnapshot {
                upper: 0.0,
                mid: 0.0,
                lower: 0.0,
            },
        })
        .collect()
}
