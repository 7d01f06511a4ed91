#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use quantdash::domain::error::QuantError;
pub use quantdash::domain::ohlcv::PriceBar;
use quantdash::domain::price_series::PriceSeries;
use quantdash::ports::price_data_port::PriceDataPort;
use std::collections::HashMap;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, QuantError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(QuantError::DataSource {
                reason: reason.clone(),
            });
        }
        PriceSeries::new(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Daily bars from closes: open is the previous close, wicks span the body.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let mut prev = closes.first().copied().unwrap_or(0.0);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let bar = PriceBar {
                timestamp: start_time() + Duration::days(i as i64),
                open: prev,
                high: prev.max(close),
                low: prev.min(close),
                close,
                volume: 1000.0,
            };
            prev = close;
            bar
        })
        .collect()
}

pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(bars_from_closes(closes)).unwrap()
}

/// Fixed-increment uptrend with zero volatility.
pub fn monotonic_closes(count: usize) -> Vec<f64> {
    (0..count).map(|i| 100.0 + i as f64).collect()
}

/// 50-bar climb, a three-bar pullback, then recovery.
///
/// RSI(14) dips to about 40 at bar 52 while the close (131) stays above
/// SMA(50) (about 126.7), so `trend_continuation` buys there.
pub fn pullback_closes() -> Vec<f64> {
    let mut closes = monotonic_closes(50);
    closes.extend([143.0, 137.0, 131.0]);
    closes.extend((0..17).map(|i| 132.0 + i as f64));
    closes
}

pub fn csv_content(bars: &[PriceBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

/// Two-bar oscillation around 100.5 for 60 bars.
fn ranging_closes() -> Vec<f64> {
    (0..60).map(|i| 100.0 + (i % 2) as f64).collect()
}

/// Quiet range, then a close at 95 far below the lower band (RSI about 35.5)
/// and a climb back into the range.
pub fn lower_band_spike_closes() -> Vec<f64> {
    let mut closes = ranging_closes();
    closes.extend([95.0, 96.0, 97.0, 98.0, 99.0, 100.0]);
    closes.extend((0..10).map(|i| 101.0 - (i % 2) as f64));
    closes
}

/// Quiet range, then a close at 106 above the upper band (RSI about 65.3)
/// and a slide back into the range.
pub fn upper_band_spike_closes() -> Vec<f64> {
    let mut closes = ranging_closes();
    closes.extend([106.0, 105.0, 104.0, 103.0, 102.0, 101.0]);
    closes.extend((0..10).map(|i| 100.0 + (i % 2) as f64));
    closes
}

/// Steep 40-bar decline, a 15-bar flat base, then a 54-point gap up at
/// bar 55 and the given follow-through.
///
/// The gap lifts RSI(14) to about 70.6 while the close (159.5) is still
/// below SMA(50) (about 162.3): an overbought bounce inside a downtrend.
pub fn relief_rally_closes(follow: impl Fn(usize) -> f64) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..40).map(|i| 300.0 - 5.0 * i as f64).collect();
    closes.extend((1..=15).map(|i| 105.0 + if i % 2 == 1 { 0.5 } else { 0.0 }));
    closes.push(159.5);
    closes.extend((1..=12).map(&follow));
    closes
}

/// Mirror image of [`relief_rally_closes`] with a 54-point gap down:
/// RSI about 29.4 with the close (240.5) above SMA(50) (about 237.7).
pub fn flush_in_uptrend_closes() -> Vec<f64> {
    relief_rally_closes(|j| 159.5 - 2.0 * j as f64)
        .into_iter()
        .map(|c| 400.0 - c)
        .collect()
}
