use thiserror::Error;

/// Custom error types for the ivsurface-rs library
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No data: {0}")]
    EmptyData(String),

    #[error("Market engine synchronization failed")]
    SyncFailed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SurfaceError>;
