//! Service error types.

/// Service error type.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("data API server is already running")]
    AlreadyRunning,
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
