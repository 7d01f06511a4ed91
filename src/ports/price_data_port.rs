//! Price history source port.

use crate::domain::error::QuantError;
use crate::domain::price_series::PriceSeries;

/// Supplies validated price history for a symbol.
pub trait PriceDataPort {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, QuantError>;
}
