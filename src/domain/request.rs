//! Request/response boundary for backtest runs.

use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest_with_config};
use crate::domain::error::QuantError;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::{StrategyId, StrategyRegistry};
use crate::ports::result_port::ResultRepository;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A backtest job as it arrives over the wire. Deserializing validates the
/// bars, so a malformed series never reaches the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub symbol: String,
    pub price_series: PriceSeries,
    pub strategy_id: String,
    pub risk_percent: f64,
}

/// A result as kept in a [`ResultRepository`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBacktest {
    pub symbol: String,
    pub strategy_id: StrategyId,
    pub risk_percent: f64,
    pub created_at: NaiveDateTime,
    pub result: BacktestResult,
}

pub fn run_request(
    request: &BacktestRequest,
    config: &BacktestConfig,
) -> Result<BacktestResult, QuantError> {
    let strategy = StrategyRegistry::new().get(&request.strategy_id)?;
    tracing::debug!(symbol = %request.symbol, strategy = %strategy.id, "running request");
    run_backtest_with_config(&request.price_series, strategy, request.risk_percent, config)
}

/// Runs `request` and appends the result to `repository` under `key`.
pub fn run_and_store(
    request: &BacktestRequest,
    config: &BacktestConfig,
    repository: &dyn ResultRepository,
    key: &str,
) -> Result<StoredBacktest, QuantError> {
    let strategy_id: StrategyId = request.strategy_id.parse()?;
    let result = run_request(request, config)?;
    let record = StoredBacktest {
        symbol: request.symbol.clone(),
        strategy_id,
        risk_percent: request.risk_percent,
        created_at: Utc::now().naive_utc(),
        result,
    };
    repository.put(key, record.clone())?;
    tracing::info!(key, symbol = %record.symbol, "backtest stored");
    Ok(record)
}
