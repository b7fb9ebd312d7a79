//! Tally Core - Sessions and tool dispatch
//!
//! This crate provides:
//! - Session: session records and the `SessionService` trait
//! - Backends: in-memory (volatile) and SQLite (durable) session services
//! - Bootstrap: reuse-or-create resolution of a user's session
//! - Dispatch: running a tool against a session's state and persisting it

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dispatch;
pub mod error;
pub mod session;

pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use session::{
    initial_state, resolve_session, InMemorySessionService, Resolution, Session, SessionBackend,
    SessionBackendConfig, SessionService, SqliteSessionService,
};
