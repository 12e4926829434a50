//! # Application Error Type
//!
//! Unified error type for the binary's top level.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Dukaan                                 │
//! │                                                                         │
//! │  Per-line failures never reach this type:                              │
//! │    • bad intent ───────► ActionResult::Error in the output line         │
//! │    • malformed JSON ───► ActionResult::Unknown in the output line       │
//! │    • failed save ──────► logged, retried on the next line               │
//! │                                                                         │
//! │  Only startup and stream failures end the process:                     │
//! │    • ConfigError ──┐                                                    │
//! │    • DbError ──────┼──► AppError ──► main() logs it, exits non-zero     │
//! │    • io::Error ────┤                                                    │
//! │    • JSON encode ──┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::config::ConfigError;
use dukaan_db::DbError;

/// Top-level failure of the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode result: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error codes for log lines and exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Config file unreadable or invalid
    Config,

    /// Database unreachable or failed
    Database,

    /// stdin/stdout broken
    Stream,
}

impl AppError {
    /// Machine-readable category for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Config(_) => ErrorCode::Config,
            AppError::Db(_) => ErrorCode::Database,
            AppError::Io(_) | AppError::Json(_) => ErrorCode::Stream,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self.code() {
            ErrorCode::Config => 78,
            ErrorCode::Database => 69,
            ErrorCode::Stream => 74,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err: AppError = ConfigError::Invalid("top_n must be greater than 0".into()).into();
        assert_eq!(err.code(), ErrorCode::Config);
        assert!(err.to_string().contains("top_n"));

        let err: AppError = DbError::PoolExhausted.into();
        assert_eq!(err.code(), ErrorCode::Database);
        assert_eq!(err.exit_code(), 69);

        let err: AppError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert_eq!(err.code(), ErrorCode::Stream);
    }
}
