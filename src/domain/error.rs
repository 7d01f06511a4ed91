//! Domain error types.
//!
//! Indicator and pattern code never produces these: short history is absorbed
//! into sentinel values. Errors are reserved for malformed input, unknown
//! strategies and the collaborators behind the ports.

/// Top-level error type for quantdash.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("timestamps must be strictly increasing (bar {index} is not after its predecessor)")]
    UnorderedTimestamps { index: usize },

    #[error("risk per trade must be within (0, 100] percent, got {value}")]
    InvalidRisk { value: f64 },

    #[error("strategy not found: {id}")]
    StrategyNotFound { id: String },

    #[error("invalid advisor signal: {reason}")]
    InvalidAdvice { reason: String },

    #[error("advisor error: {reason}")]
    Advisor { reason: String },

    #[error("price data error: {reason}")]
    DataSource { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantError {
    pub(crate) fn invalid_bar(index: usize, reason: impl Into<String>) -> Self {
        QuantError::InvalidBar {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        QuantError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        let code: u8 = match err {
            QuantError::Io(_) => 1,
            QuantError::ConfigParse { .. }
            | QuantError::ConfigMissing { .. }
            | QuantError::ConfigInvalid { .. } => 2,
            QuantError::Database { .. } | QuantError::DatabaseQuery { .. } => 3,
            QuantError::StrategyNotFound { .. } => 4,
            QuantError::InvalidBar { .. }
            | QuantError::UnorderedTimestamps { .. }
            | QuantError::InvalidRisk { .. }
            | QuantError::DataSource { .. } => 5,
            QuantError::Serialization(_)
            | QuantError::Advisor { .. }
            | QuantError::InvalidAdvice { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
