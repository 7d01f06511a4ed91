//! Core domain types and logic.

pub mod advisor;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod pattern;
pub mod portfolio;
pub mod position;
pub mod price_series;
pub mod request;
pub mod snapshot;
pub mod strategy;
