//! Configuration access port trait.

use crate::domain::error::QuantError;

/// Typed lookups into `[section] key = value` configuration.
///
/// Getters with a default return it when the key is absent or unparsable.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Non-negative integer; negative values are a configuration error.
    fn get_usize(&self, section: &str, key: &str, default: usize) -> Result<usize, QuantError> {
        let value = self.get_int(section, key, default as i64);
        usize::try_from(value).map_err(|_| {
            QuantError::config_invalid(section, key, format!("must be non-negative, got {value}"))
        })
    }
}
