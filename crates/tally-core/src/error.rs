//! Error types for tally-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No session with this id for the (app, user) pair
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A session with this id already exists
    #[error("session already exists: {0}")]
    SessionExists(String),

    /// Configuration error (unknown backend, bad path)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Tool lookup or permission error
    #[error("tool error: {0}")]
    Tool(#[from] tally_tools::Error),

    /// Internal error (storage, serialization)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_errors_convert() {
        let err: Error = tally_tools::Error::NotFound("ghost".to_string()).into();
        assert!(matches!(err, Error::Tool(_)));
        assert_eq!(err.to_string(), "tool error: tool not found: ghost");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::SessionNotFound("abc".to_string()).to_string(),
            "session not found: abc"
        );
    }
}
