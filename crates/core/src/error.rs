use std::result::Result as StdResult;

use thiserror::Error;

/// Errors surfaced by the memory engine.
///
/// Every public operation returns exactly one of these kinds. Adapters map
/// them at their own boundary: the HTTP layer turns them into 400/404/500,
/// the MCP layer reports them on the tool-result error channel, the CLI
/// prints them to stderr and exits 1. The core never maps transport codes.
#[derive(Debug, Error)]
pub enum EngramError {
    /// Caller supplied invalid or missing input. No partial writes occur.
    #[error("invalid input: {0}")]
    Validation(String),

    /// No live row matches the requested identity (absent or soft-deleted).
    #[error("not found: {0}")]
    NotFound(String),

    /// Database or I/O failure, wrapped with the failing operation name.
    #[error("{op}: {message}")]
    Storage { op: &'static str, message: String },
}

impl EngramError {
    /// Wraps a lower-level failure with the operation it happened in.
    pub fn storage(op: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Storage { op, message: err.to_string() }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = StdResult<T, EngramError>;
