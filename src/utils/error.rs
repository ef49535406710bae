use crate::utils::output::OutputStyle;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Missing file: {0}")]
    MissingFile(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Dispatch failure: {0}")]
    Dispatch(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("System error: {0}")]
    System(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Result type alias for consistent error handling across the application
pub type AppResult<T> = Result<T, AppError>;

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

pub fn report_error(err: &AppError) {
    match err {
        AppError::Network(msg) => {
            eprintln!("🌐 {}", OutputStyle::error(&format!("Network: {}", msg)));
        }
        AppError::Protocol(msg) => {
            eprintln!("⚠️  {}", OutputStyle::warning(msg));
        }
        AppError::InvalidArguments(msg) | AppError::MissingFile(msg) => {
            eprintln!("⚠️  {}", OutputStyle::warning(&err.to_string()));
            tracing::debug!(detail = %msg, "rejected before dispatch");
        }
        AppError::Dispatch(msg) | AppError::Io(msg) | AppError::System(msg) => {
            eprintln!("❌ {}", OutputStyle::error(msg));
        }
    }
}
