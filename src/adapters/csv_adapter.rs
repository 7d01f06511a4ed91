//! CSV file price data adapter.
//!
//! Files are named `<symbol>.csv` under a base directory and carry a header
//! row `timestamp,open,high,low,close,volume`. Rows are sorted by timestamp
//! before validation, so a duplicated timestamp still fails the series.

use crate::domain::error::QuantError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::price_series::PriceSeries;
use crate::ports::price_data_port::PriceDataPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    /// Reads and validates one CSV file.
    pub fn read_path(path: &Path) -> Result<PriceSeries, QuantError> {
        let content = fs::read_to_string(path).map_err(|e| QuantError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let mut bars = parse_bars(&content)?;
        bars.sort_by_key(|b| b.timestamp);
        tracing::debug!(path = %path.display(), bars = bars.len(), "csv loaded");
        PriceSeries::new(bars)
    }
}

impl PriceDataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, QuantError> {
        Self::read_path(&self.csv_path(symbol))
    }
}

fn parse_bars(content: &str) -> Result<Vec<PriceBar>, QuantError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    rdr.deserialize::<CsvRow>()
        .enumerate()
        .map(|(line, row)| {
            let row = row.map_err(|e| QuantError::DataSource {
                reason: format!("CSV parse error: {e}"),
            })?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                QuantError::DataSource {
                    reason: format!(
                        "invalid timestamp '{}' on data row {}",
                        row.timestamp,
                        line + 1
                    ),
                }
            })?;
            Ok(PriceBar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            })
        })
        .collect()
}

/// Accepts `YYYY-MM-DD` (midnight), `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
