//! Tally Tools - Tool registry, table store and reminder list
//!
//! This crate provides the tool side of Tally:
//! - Registry: tool definitions and lookup
//! - Runner: dispatch with validation, logging and structured failures
//! - Table store: generic CRUD over an externally owned SQLite database
//! - Reminders: an ordered list kept in session state
//! - Builtins: the tools that expose the above to an agent runtime

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod context;
pub mod error;
pub mod registry;
pub mod reminders;
pub mod runner;
pub mod table_store;

pub use builtins::{register_builtins, register_builtins_with_config, BuiltinsConfig};
pub use context::{SessionState, ToolContext};
pub use error::{Error, Result};
pub use registry::{Tool, ToolCategory, ToolDefinition, ToolRegistry, ToolResult};
pub use reminders::REMINDERS_KEY;
pub use runner::{ExecutionOptions, ExecutionResult, ToolRunner};
pub use table_store::{FailureKind, TableStore};
