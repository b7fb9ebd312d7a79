//! Error types for tally-tools

use thiserror::Error;

/// Tool error type
#[derive(Debug, Error)]
pub enum Error {
    /// Tool not found
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Tool execution failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Tool is disabled for this agent
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Tool requires a session state but none was supplied
    #[error("missing session state for tool: {0}")]
    MissingState(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
