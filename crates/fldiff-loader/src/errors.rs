//! Error handling for fldiff-loader
//!
//! Wraps fldiff-core ExError with loader-specific helpers

use fldiff_core::errors::{ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a stream parse error
pub fn parse_error(operation: &str, err: &serde_yaml::Error) -> ExError {
    let message = match err.location() {
        Some(at) => format!("line {}, column {}: {}", at.line(), at.column(), err),
        None => err.to_string(),
    };
    ExError::new(ExErrorKind::Parse)
        .with_op(operation.to_string())
        .with_message(message)
}

/// Create an IO error carrying the offending path
pub fn io_error(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_path(path.display().to_string())
        .with_message(err.to_string())
}

/// Create a serialization error
pub fn serialization_error(operation: &str, err: &serde_yaml::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
