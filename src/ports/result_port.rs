//! Backtest result storage port.

use crate::domain::error::QuantError;
use crate::domain::request::StoredBacktest;

/// Append-only store of backtest results keyed by user or session.
pub trait ResultRepository {
    fn put(&self, key: &str, record: StoredBacktest) -> Result<(), QuantError>;

    /// Every record stored under `key`, oldest first.
    fn get_all(&self, key: &str) -> Result<Vec<StoredBacktest>, QuantError>;
}
