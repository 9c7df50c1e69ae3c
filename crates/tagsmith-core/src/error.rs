//! Error types for the batch engine.

use thiserror::Error;

/// Core error type for engine operations.
///
/// Per-item analysis failures never surface here; they are recorded on the
/// item and reported through the event channel. This type covers problems
/// that fail an operation itself, such as invalid configuration at start
/// or an export that cannot be written.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration errors caught before any item is dispatched.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Export serialization errors.
    #[error("Export error: {0}")]
    Export(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = EngineError::InvalidConfig("concurrency must be at least 1".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("concurrency"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
