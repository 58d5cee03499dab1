//! Configuration error types.

use thiserror::Error;

/// Invalid or unreadable engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
    /// Configuration text could not be parsed.
    #[error("Failed to parse {format} configuration: {message}")]
    Parse {
        /// Source format ("toml" or "json").
        format: &'static str,
        /// Parser message.
        message: String,
    },
    /// Configuration file could not be read.
    #[error("Failed to read configuration file {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error message.
        message: String,
    },
}
