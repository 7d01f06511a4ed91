//! In-process result repository.

use crate::domain::error::QuantError;
use crate::domain::request::StoredBacktest;
use crate::ports::result_port::ResultRepository;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<HashMap<String, Vec<StoredBacktest>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<StoredBacktest>>>, QuantError> {
        self.records.lock().map_err(|_| QuantError::Database {
            reason: "result store lock poisoned".to_string(),
        })
    }
}

impl ResultRepository for MemoryRepository {
    fn put(&self, key: &str, record: StoredBacktest) -> Result<(), QuantError> {
        self.lock()?.entry(key.to_string()).or_default().push(record);
        Ok(())
    }

    fn get_all(&self, key: &str) -> Result<Vec<StoredBacktest>, QuantError> {
        Ok(self.lock()?.get(key).cloned().unwrap_or_default())
    }
}
