//! Candlestick pattern detection.
//!
//! The detector walks consecutive bar pairs `(i-1, i)` once and emits every
//! rule that matches bar `i`. Rules are not mutually exclusive: a bar can be
//! both a doji and a hammer, and both events are reported.

use crate::domain::ohlcv::PriceBar;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Polarity {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    #[serde(rename = "Bullish Engulfing")]
    BullishEngulfing,
    #[serde(rename = "Bearish Engulfing")]
    BearishEngulfing,
    #[serde(rename = "Doji")]
    Doji,
    #[serde(rename = "Hammer")]
    Hammer,
    #[serde(rename = "Shooting Star")]
    ShootingStar,
}

impl PatternKind {
    pub fn polarity(self) -> Polarity {
        match self {
            PatternKind::BullishEngulfing | PatternKind::Hammer => Polarity::Bullish,
            PatternKind::BearishEngulfing | PatternKind::ShootingStar => Polarity::Bearish,
            PatternKind::Doji => Polarity::Neutral,
        }
    }

    pub fn confidence(self) -> u8 {
        match self {
            PatternKind::BullishEngulfing | PatternKind::BearishEngulfing => 85,
            PatternKind::Hammer | PatternKind::ShootingStar => 75,
            PatternKind::Doji => 60,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::BullishEngulfing => "Bullish Engulfing",
            PatternKind::BearishEngulfing => "Bearish Engulfing",
            PatternKind::Doji => "Doji",
            PatternKind::Hammer => "Hammer",
            PatternKind::ShootingStar => "Shooting Star",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEvent {
    pub name: PatternKind,
    pub polarity: Polarity,
    /// 0-100
    pub confidence: u8,
    pub bar_index: usize,
}

impl PatternEvent {
    fn new(kind: PatternKind, bar_index: usize) -> Self {
        PatternEvent {
            name: kind,
            polarity: kind.polarity(),
            confidence: kind.confidence(),
            bar_index,
        }
    }
}

/// Body/wick ratios the rules are evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternThresholds {
    /// Doji when body < ratio × range.
    pub doji_body_ratio: f64,
    /// Pin bars need the long wick > ratio × body.
    pub long_wick_ratio: f64,
    /// Pin bars need the opposite wick < ratio × body.
    pub short_wick_ratio: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        PatternThresholds {
            doji_body_ratio: 0.1,
            long_wick_ratio: 2.0,
            short_wick_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternDetector {
    thresholds: PatternThresholds,
}

impl PatternDetector {
    pub fn new(thresholds: PatternThresholds) -> Self {
        PatternDetector { thresholds }
    }

    /// Scans all consecutive bar pairs; events come out ordered by bar index,
    /// then by rule order (engulfing, doji, hammer, shooting star).
    pub fn scan(&self, bars: &[PriceBar]) -> Vec<PatternEvent> {
        let mut events = Vec::new();
        for (offset, pair) in bars.windows(2).enumerate() {
            let index = offset + 1;
            let (prev, curr) = (&pair[0], &pair[1]);

            if is_bullish_engulfing(prev, curr) {
                events.push(PatternEvent::new(PatternKind::BullishEngulfing, index));
            }
            if is_bullish_engulfing(&mirror(prev), &mirror(curr)) {
                events.push(PatternEvent::new(PatternKind::BearishEngulfing, index));
            }
            if self.is_doji(curr) {
                events.push(PatternEvent::new(PatternKind::Doji, index));
            }
            if self.is_pin(curr.lower_wick(), curr.upper_wick(), curr.body()) {
                events.push(PatternEvent::new(PatternKind::Hammer, index));
            }
            if self.is_pin(curr.upper_wick(), curr.lower_wick(), curr.body()) {
                events.push(PatternEvent::new(PatternKind::ShootingStar, index));
            }
        }
        events
    }

    fn is_doji(&self, bar: &PriceBar) -> bool {
        bar.body() < self.thresholds.doji_body_ratio * bar.range()
    }

    fn is_pin(&self, long_wick: f64, short_wick: f64, body: f64) -> bool {
        long_wick > self.thresholds.long_wick_ratio * body
            && short_wick < self.thresholds.short_wick_ratio * body
    }
}

/// Scan with the default thresholds.
pub fn detect_patterns(bars: &[PriceBar]) -> Vec<PatternEvent> {
    PatternDetector::default().scan(bars)
}

fn is_bullish_engulfing(prev: &PriceBar, curr: &PriceBar) -> bool {
    prev.is_bearish()
        && curr.is_bullish()
        && curr.open <= prev.close
        && curr.close >= prev.open
        && curr.body() > prev.body()
}

/// Reflects a bar through zero so bearish rules can reuse the bullish ones.
fn mirror(bar: &PriceBar) -> PriceBar {
    PriceBar {
        timestamp: bar.timestamp,
        open: -bar.open,
        high: -bar.low,
        low: -bar.high,
        close: -bar.close,
        volume: bar.volume,
    }
}
