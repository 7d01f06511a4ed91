//! CLI definition and dispatch.
//!
//! Every subcommand prints JSON on stdout; diagnostics go through `tracing`
//! to stderr. Failures map to exit codes via `From<&QuantError> for ExitCode`.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest_with_config};
use crate::domain::config_validation::{
    DEFAULT_LOG_LEVEL, build_backtest_config, log_directive, risk_percent,
};
use crate::domain::error::QuantError;
use crate::domain::metrics::Metrics;
use crate::domain::pattern::detect_patterns;
use crate::domain::request::{BacktestRequest, run_and_store, run_request};
use crate::domain::snapshot::IndicatorFrame;
use crate::domain::strategy::{Strategy, StrategyId, StrategyRegistry};
use crate::ports::result_port::ResultRepository;

#[derive(Parser, Debug)]
#[command(name = "quantdash", about = "Indicator, pattern and strategy backtest engine")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest a strategy over a CSV price file
    Backtest {
        csv: PathBuf,
        #[arg(short, long)]
        strategy: String,
        /// Percent of equity risked per trade; defaults to [backtest] risk_percent
        #[arg(short, long)]
        risk: Option<f64>,
        /// Append the result to the sqlite store under this key
        #[arg(long)]
        store: Option<String>,
        /// Include extended performance metrics
        #[arg(long)]
        metrics: bool,
    },
    /// Run a JSON backtest request
    Request {
        file: PathBuf,
        #[arg(long)]
        store: Option<String>,
    },
    /// Print the indicator snapshot for a CSV price file
    Indicators {
        csv: PathBuf,
        /// One snapshot per bar instead of only the latest
        #[arg(long)]
        all: bool,
    },
    /// Print candlestick pattern events for a CSV price file
    Patterns { csv: PathBuf },
    /// List the built-in strategies
    Strategies,
    /// Show stored backtests for a key
    History {
        #[arg(long)]
        key: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BacktestOutput<'a> {
    result: &'a BacktestResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<Metrics>,
}

#[derive(Serialize)]
struct StrategyInfo {
    id: StrategyId,
    name: &'static str,
    description: &'static str,
}

impl From<&Strategy> for StrategyInfo {
    fn from(s: &Strategy) -> Self {
        StrategyInfo {
            id: s.id,
            name: s.name,
            description: s.description,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), QuantError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Backtest {
            csv,
            strategy,
            risk,
            store,
            metrics,
        } => cmd_backtest(&config, &csv, &strategy, risk, store.as_deref(), metrics),
        Command::Request { file, store } => cmd_request(&config, &file, store.as_deref()),
        Command::Indicators { csv, all } => cmd_indicators(&csv, all),
        Command::Patterns { csv } => print_json(&detect_patterns(&CsvAdapter::read_path(&csv)?)),
        Command::Strategies => {
            let list: Vec<StrategyInfo> = StrategyRegistry::new()
                .all()
                .iter()
                .map(StrategyInfo::from)
                .collect();
            print_json(&list)
        }
        Command::History { key } => print_json(&open_repository(&config)?.get_all(&key)?),
    }
}

/// The file at `path`, or an empty configuration when none was given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, QuantError> {
    match path {
        Some(p) => {
            tracing::debug!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// `RUST_LOG` when set, else `[logging] level` from the config, else `info`.
pub fn log_filter(cli: &Cli) -> String {
    if let Ok(directive) = std::env::var("RUST_LOG") {
        if !directive.trim().is_empty() {
            return directive;
        }
    }
    // Config errors surface later from dispatch with a proper exit code.
    load_config(cli.config.as_deref())
        .map(|c| log_directive(&c))
        .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
}

fn cmd_backtest(
    config: &FileConfigAdapter,
    csv: &Path,
    strategy_id: &str,
    risk: Option<f64>,
    store: Option<&str>,
    with_metrics: bool,
) -> Result<(), QuantError> {
    let bt_config = build_backtest_config(config)?;
    let risk = match risk {
        Some(r) => r,
        None => risk_percent(config)?,
    };
    let strategy = StrategyRegistry::new().get(strategy_id)?;
    let series = CsvAdapter::read_path(csv)?;

    match store {
        Some(key) => {
            let symbol = csv
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let request = BacktestRequest {
                symbol,
                price_series: series,
                strategy_id: strategy.id.as_str().to_string(),
                risk_percent: risk,
            };
            let repository = open_repository(config)?;
            let stored = run_and_store(&request, &bt_config, repository.as_ref(), key)?;
            print_backtest(&stored.result, &bt_config, with_metrics)
        }
        None => {
            let result = run_backtest_with_config(&series, strategy, risk, &bt_config)?;
            print_backtest(&result, &bt_config, with_metrics)
        }
    }
}

fn print_backtest(
    result: &BacktestResult,
    bt_config: &BacktestConfig,
    with_metrics: bool,
) -> Result<(), QuantError> {
    if with_metrics {
        print_json(&BacktestOutput {
            result,
            metrics: Some(Metrics::compute(result, bt_config.initial_equity)),
        })
    } else {
        print_json(result)
    }
}

fn cmd_request(
    config: &FileConfigAdapter,
    file: &Path,
    store: Option<&str>,
) -> Result<(), QuantError> {
    let bt_config = build_backtest_config(config)?;
    let request: BacktestRequest = serde_json::from_str(&fs::read_to_string(file)?)?;

    let result = match store {
        Some(key) => {
            let repository = open_repository(config)?;
            run_and_store(&request, &bt_config, repository.as_ref(), key)?.result
        }
        None => run_request(&request, &bt_config)?,
    };
    print_json(&result)
}

fn cmd_indicators(csv: &Path, all: bool) -> Result<(), QuantError> {
    let series = CsvAdapter::read_path(csv)?;
    let frame = IndicatorFrame::compute(&series);
    if all {
        let snapshots: Vec<_> = (0..frame.len())
            .filter_map(|i| frame.snapshot_at(i))
            .collect();
        print_json(&snapshots)
    } else {
        print_json(&frame.latest())
    }
}

#[cfg(feature = "sqlite")]
fn open_repository(config: &FileConfigAdapter) -> Result<Box<dyn ResultRepository>, QuantError> {
    use crate::adapters::sqlite_adapter::SqliteRepository;

    let repository = SqliteRepository::from_config(config)?;
    repository.initialize_schema()?;
    Ok(Box::new(repository))
}

#[cfg(not(feature = "sqlite"))]
fn open_repository(_config: &FileConfigAdapter) -> Result<Box<dyn ResultRepository>, QuantError> {
    Err(QuantError::Database {
        reason: "result storage requires the sqlite feature".to_string(),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), QuantError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

