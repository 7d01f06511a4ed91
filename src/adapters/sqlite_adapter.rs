//! SQLite backtest result repository.
//!
//! Each stored backtest is one row; the full record is kept as a JSON
//! payload next to a few indexed columns for lookup.

use crate::domain::error::QuantError;
use crate::domain::request::StoredBacktest;
use crate::ports::config_port::ConfigPort;
use crate::ports::result_port::ResultRepository;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteRepository {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteRepository {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, QuantError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| QuantError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let raw_pool_size = config.get_int("sqlite", "pool_size", 4);
        let pool_size = u32::try_from(raw_pool_size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                QuantError::config_invalid(
                    "sqlite",
                    "pool_size",
                    format!("must be within 1..={}, got {raw_pool_size}", u32::MAX),
                )
            })?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| QuantError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "sqlite pool opened");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, QuantError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| QuantError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, QuantError> {
        self.pool.get().map_err(|e: r2d2::Error| QuantError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), QuantError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS backtest_results (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_key TEXT NOT NULL,
                    symbol TEXT NOT NULL,
                    strategy_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    payload TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_backtest_results_owner
                    ON backtest_results(owner_key);",
            )
            .map_err(|e: rusqlite::Error| QuantError::DatabaseQuery {
                reason: e.to_string(),
            })
    }
}

impl ResultRepository for SqliteRepository {
    fn put(&self, key: &str, record: StoredBacktest) -> Result<(), QuantError> {
        let payload = serde_json::to_string(&record)?;
        self.conn()?
            .execute(
                "INSERT INTO backtest_results (owner_key, symbol, strategy_id, created_at, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    key,
                    record.symbol,
                    record.strategy_id.as_str(),
                    record.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    payload
                ],
            )
            .map_err(|e: rusqlite::Error| QuantError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn get_all(&self, key: &str) -> Result<Vec<StoredBacktest>, QuantError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT payload FROM backtest_results WHERE owner_key = ?1 ORDER BY id ASC")
            .map_err(|e: rusqlite::Error| QuantError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .map_err(|e: rusqlite::Error| QuantError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut records = Vec::new();
        for row in rows {
            let payload = row.map_err(|e: rusqlite::Error| QuantError::DatabaseQuery {
                reason: e.to_string(),
            })?;
            records.push(serde_json::from_str(&payload)?);
        }
        Ok(records)
    }
}
