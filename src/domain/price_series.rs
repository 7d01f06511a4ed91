//! Validated, read-only price history.

use crate::domain::error::QuantError;
use crate::domain::ohlcv::PriceBar;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Ordered bars with strictly ascending timestamps and well-formed OHLC values.
///
/// Construction is the only place bars are checked; everything downstream
/// (indicators, patterns, backtests) trusts the invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<PriceBar>", try_from = "Vec<PriceBar>")]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, QuantError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.check_shape()
                .map_err(|reason| QuantError::invalid_bar(index, reason))?;
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(QuantError::UnorderedTimestamps { index });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }
}

impl Deref for PriceSeries {
    type Target = [PriceBar];

    fn deref(&self) -> &[PriceBar] {
        &self.bars
    }
}

impl From<PriceSeries> for Vec<PriceBar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

impl TryFrom<Vec<PriceBar>> for PriceSeries {
    type Error = QuantError;

    fn try_from(bars: Vec<PriceBar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}
