use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
    #[error("Invalid log format: {0} (expected: text|json)")]
    InvalidFormat(String),
    #[error("Logger has already been initialized")]
    AlreadyInitialized,
    #[error("Cannot open log file in {dir}: {source}")]
    FileSink {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to initialize logger: {0}")]
    InitializationFailed(String),
}
