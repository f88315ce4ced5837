use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for the rotating CSV logger
#[derive(Debug, Error)]
pub enum RotateError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // File lifecycle errors
    #[error("Failed to create directory: {0}")]
    DirectoryError(String),

    #[error("Failed to open log file: {0}")]
    LogFileError(String),

    #[error("Failed to write log entry: {0}")]
    LogWriteError(String),

    #[error("Log rotation failed: {0}")]
    LogRotationError(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Payload errors
    #[error("Unsupported payload: {0}")]
    UnsupportedPayload(String),
}

impl RotateError {
    /// Classify the error into the coarse kind reported on the event stream
    pub fn kind(&self) -> ErrorKind {
        match self {
            RotateError::ConfigError(_)
            | RotateError::InvalidConfig(_)
            | RotateError::MissingConfigField(_)
            | RotateError::ConfigValidationError(_) => ErrorKind::Configuration,
            RotateError::DirectoryError(_)
            | RotateError::LogFileError(_)
            | RotateError::LogWriteError(_)
            | RotateError::LogRotationError(_)
            | RotateError::Io(_) => ErrorKind::Io,
            RotateError::UnsupportedPayload(_) => ErrorKind::UnsupportedPayload,
        }
    }
}

/// Coarse failure taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Io,
    UnsupportedPayload,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Io => "IOError",
            ErrorKind::UnsupportedPayload => "UnsupportedPayload",
        };
        f.write_str(name)
    }
}

/// Result type alias for logger operations
pub type Result<T> = std::result::Result<T, RotateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RotateError::MissingConfigField("filename".to_string()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            RotateError::LogRotationError("rename".to_string()).kind(),
            ErrorKind::Io
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(RotateError::from(io).kind(), ErrorKind::Io);
        assert_eq!(
            RotateError::UnsupportedPayload("bytes".to_string()).kind(),
            ErrorKind::UnsupportedPayload
        );
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Io.to_string(), "IOError");
        assert_eq!(ErrorKind::Configuration.to_string(), "ConfigurationError");
    }
}
