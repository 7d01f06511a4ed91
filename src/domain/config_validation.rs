//! Builds validated run settings from configuration.
//!
//! Missing keys fall back to the engine defaults; present but out-of-range
//! values fail with [`QuantError::ConfigInvalid`].

use crate::domain::backtest::{BacktestConfig, validate_risk};
use crate::domain::error::QuantError;
use crate::domain::execution::FillModel;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_RISK_PERCENT: f64 = 1.0;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, QuantError> {
    let defaults = BacktestConfig::default();
    let built = BacktestConfig {
        initial_equity: config.get_double("backtest", "initial_equity", defaults.initial_equity),
        warmup_bars: config.get_usize("backtest", "warmup_bars", defaults.warmup_bars)?,
        exit_horizon: config.get_usize("backtest", "exit_horizon", defaults.exit_horizon)?,
        cooldown_bars: config.get_usize("backtest", "cooldown_bars", defaults.cooldown_bars)?,
        reward_risk: config.get_double("backtest", "reward_risk", defaults.reward_risk),
        stop_atr_multiple: config.get_double(
            "backtest",
            "stop_atr_multiple",
            defaults.stop_atr_multiple,
        ),
        fallback_stop_pct: config.get_double(
            "backtest",
            "fallback_stop_pct",
            defaults.fallback_stop_pct,
        ),
        fill_model: build_fill_model(config)?,
    };
    built.validate()?;
    Ok(built)
}

pub fn build_fill_model(config: &dyn ConfigPort) -> Result<FillModel, QuantError> {
    let model = config
        .get_string("fill", "model")
        .map(|m| m.trim().to_lowercase())
        .unwrap_or_else(|| "price".to_string());

    match model.as_str() {
        "price" => Ok(FillModel::PriceDriven),
        "synthetic" => Ok(FillModel::Synthetic {
            win_probability: config.get_double(
                "fill",
                "win_probability",
                FillModel::DEFAULT_WIN_PROBABILITY,
            ),
            seed: parse_seed(config)?,
        }),
        other => Err(QuantError::config_invalid(
            "fill",
            "model",
            format!("unknown fill model '{other}', expected price or synthetic"),
        )),
    }
}

fn parse_seed(config: &dyn ConfigPort) -> Result<Option<u64>, QuantError> {
    match config.get_string("fill", "seed") {
        None => Ok(None),
        Some(s) => s.trim().parse::<u64>().map(Some).map_err(|_| {
            QuantError::config_invalid("fill", "seed", format!("'{s}' is not an unsigned integer"))
        }),
    }
}

/// `[backtest] risk_percent`, validated like a request's risk.
pub fn risk_percent(config: &dyn ConfigPort) -> Result<f64, QuantError> {
    let value = config.get_double("backtest", "risk_percent", DEFAULT_RISK_PERCENT);
    validate_risk(value).map_err(|_| {
        QuantError::config_invalid(
            "backtest",
            "risk_percent",
            format!("must be within (0, 100], got {value}"),
        )
    })?;
    Ok(value)
}

/// `[logging] level` as an `EnvFilter` directive.
pub fn log_directive(config: &dyn ConfigPort) -> String {
    config
        .get_string("logging", "level")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}
