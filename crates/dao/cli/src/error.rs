//! CLI error types

use dao_types::{DaoError, ErrorKind};
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scenario script could not be parsed
    #[error("Script error: {0}")]
    Script(String),

    /// A step's outcome differed from its `expect` field
    #[error("Step {step} ({action}): expected {expected}, got {actual}")]
    Expectation {
        step: usize,
        action: String,
        expected: String,
        actual: String,
    },

    /// Engine rejected an operation outside a scripted step
    #[error("DAO error: {0}")]
    Dao(#[from] DaoError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    pub fn expectation(
        step: usize,
        action: &str,
        expected: Option<ErrorKind>,
        actual: Option<ErrorKind>,
    ) -> Self {
        let describe = |kind: Option<ErrorKind>| match kind {
            Some(kind) => format!("{:?}", kind),
            None => "success".to_string(),
        };
        CliError::Expectation {
            step,
            action: action.to_string(),
            expected: describe(expected),
            actual: describe(actual),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
