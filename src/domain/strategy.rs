//! Strategy registry.
//!
//! Strategies form a closed set of tagged variants. Each is a pure predicate
//! over `(bar index, IndicatorSnapshot)`; lookups by an unknown id fail with
//! [`QuantError::StrategyNotFound`] instead of substituting another strategy.

use crate::domain::error::QuantError;
use crate::domain::snapshot::IndicatorSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade direction emitted by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn direction(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    RsiDivergence,
    BbMeanReversion,
    TrendContinuation,
}

impl StrategyId {
    pub const ALL: [StrategyId; 3] = [
        StrategyId::RsiDivergence,
        StrategyId::BbMeanReversion,
        StrategyId::TrendContinuation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyId::RsiDivergence => "rsi_divergence",
            StrategyId::BbMeanReversion => "bb_mean_reversion",
            StrategyId::TrendContinuation => "trend_continuation",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = QuantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| QuantError::StrategyNotFound { id: s.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub name: &'static str,
    pub description: &'static str,
}

impl Strategy {
    /// Entry signal at `index`, if any.
    ///
    /// The index is part of the predicate's signature; the built-in rules
    /// only read the snapshot.
    pub fn evaluate(&self, _index: usize, snap: &IndicatorSnapshot) -> Option<Side> {
        match self.id {
            StrategyId::RsiDivergence => {
                if snap.rsi < 30.0 && snap.close > snap.sma50 {
                    Some(Side::Buy)
                } else if snap.rsi > 70.0 && snap.close < snap.sma50 {
                    Some(Side::Sell)
                } else {
                    None
                }
            }
            StrategyId::BbMeanReversion => {
                if snap.close < snap.bollinger.lower && snap.rsi < 40.0 {
                    Some(Side::Buy)
                } else if snap.close > snap.bollinger.upper && snap.rsi > 60.0 {
                    Some(Side::Sell)
                } else {
                    None
                }
            }
            StrategyId::TrendContinuation => {
                (snap.close > snap.sma50 && snap.rsi < 45.0).then_some(Side::Buy)
            }
        }
    }
}

static STRATEGIES: [Strategy; 3] = [
    Strategy {
        id: StrategyId::RsiDivergence,
        name: "RSI Divergence",
        description: "Buy oversold RSI above SMA50, sell overbought RSI below SMA50",
    },
    Strategy {
        id: StrategyId::BbMeanReversion,
        name: "Bollinger Mean Reversion",
        description: "Fade closes outside the 20/2 Bollinger Bands when RSI agrees",
    },
    Strategy {
        id: StrategyId::TrendContinuation,
        name: "Trend Continuation",
        description: "Buy pullbacks (RSI below 45) while close holds above SMA50",
    },
];

/// Immutable lookup over the built-in strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyRegistry;

impl StrategyRegistry {
    pub fn new() -> Self {
        StrategyRegistry
    }

    pub fn get(&self, id: &str) -> Result<&'static Strategy, QuantError> {
        let id: StrategyId = id.parse()?;
        Ok(self.by_id(id))
    }

    pub fn by_id(&self, id: StrategyId) -> &'static Strategy {
        match id {
            StrategyId::RsiDivergence => &STRATEGIES[0],
            StrategyId::BbMeanReversion => &STRATEGIES[1],
            StrategyId::TrendContinuation => &STRATEGIES[2],
        }
    }

    pub fn all(&self) -> &'static [Strategy] {
        &STRATEGIES
    }
}
