//! Session - records, services and bootstrap
//!
//! A session is identified by (app name, user id, session id) and carries an
//! opaque state mapping. Two services are provided:
//! - `SqliteSessionService` (default): persists across restarts
//! - `InMemorySessionService`: volatile, for tests and one-off runs
//!
//! `resolve_session` implements the reuse-first bootstrap: the first existing
//! session of a user is reused, and one is only created when none exists.

mod bootstrap;
mod record;
mod sqlite_store;
mod store;

pub use bootstrap::{initial_state, resolve_session, Resolution, USER_NAME_KEY};
pub use record::Session;
pub use sqlite_store::{SessionBackend, SessionBackendConfig, SqliteSessionService};
pub use store::{InMemorySessionService, SessionService};
