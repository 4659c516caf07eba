//! Error helpers for tabulara-engine
//!
//! Wraps tabulara-core ExError with engine-specific constructors

use tabulara_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a configuration parse error
pub fn config_invalid(source: &str, reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("load_config")
        .with_message(format!("Invalid dispatcher config in {}: {}", source, reason))
}

/// Create a configuration field error
pub fn config_field(field: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidConfig)
        .with_op("validate_config")
        .with_message(format!("Invalid value for {}", field))
        .with_detail(field, reason)
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
