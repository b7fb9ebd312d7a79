//! Context - per-invocation state handed to tools
//!
//! Tools never reach into ambient session state. The dispatcher borrows the
//! session's state mapping and passes it in explicitly, so a tool can be
//! exercised in tests with a plain `HashMap`.
//!
//! Callers must hold exclusive access to the state for the duration of a
//! call; two concurrent invocations against the same session state are
//! undefined and must be serialized upstream.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Opaque session state: string keys to arbitrary JSON values
pub type SessionState = HashMap<String, serde_json::Value>;

/// Invocation context for a single tool call
#[derive(Debug, Default)]
pub struct ToolContext<'a> {
    state: Option<&'a mut SessionState>,
}

impl<'a> ToolContext<'a> {
    /// Context without session state (stateless tools only)
    #[must_use]
    pub fn detached() -> Self {
        Self { state: None }
    }

    /// Context bound to a session's state mapping
    #[must_use]
    pub fn with_state(state: &'a mut SessionState) -> Self {
        Self { state: Some(state) }
    }

    /// Whether a session state is attached
    #[must_use]
    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }

    /// Borrow the session state mutably, failing for detached contexts
    pub fn state_mut(&mut self, tool_name: &str) -> Result<&mut SessionState> {
        self.state
            .as_deref_mut()
            .ok_or_else(|| Error::MissingState(tool_name.to_string()))
    }
}
