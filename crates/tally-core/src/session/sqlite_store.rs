//! SQLite session service
//!
//! Persists sessions so that a user's state (including reminders) survives
//! process restarts. This is the default backend.
//!
//! # Usage
//!
//! ```no_run
//! use tally_core::SqliteSessionService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Default location: ~/.tally/sessions.db
//! let service = SqliteSessionService::new_default().await?;
//!
//! // Or specify a custom path
//! let service = SqliteSessionService::new("/path/to/sessions.db").await?;
//! # Ok(())
//! # }
//! ```

use super::{InMemorySessionService, Session, SessionService};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tally_tools::SessionState;
use tracing::{debug, info};

type SessionRow = (String, String, String, String, DateTime<Utc>, DateTime<Utc>);

/// SQLite session service
pub struct SqliteSessionService {
    pool: SqlitePool,
}

impl SqliteSessionService {
    /// Open (or create) the session database at `path`
    ///
    /// # Errors
    ///
    /// Returns error if database creation or migration fails.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Internal(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Internal(format!("Failed to connect to SQLite: {}", e)))?;

        let service = Self { pool };
        service.init_schema().await?;

        info!(path = %path.display(), "SQLite session service initialized");
        Ok(service)
    }

    /// Open the service at the default location (~/.tally/sessions.db)
    pub async fn new_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::new(&path).await
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Internal("Could not determine home directory".to_string()))?;
        Ok(home.join(".tally").join("sessions.db"))
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                app_name TEXT NOT NULL,
                user_id TEXT NOT NULL,
                id TEXT NOT NULL,
                state TEXT NOT NULL,
                create_time TEXT NOT NULL,
                update_time TEXT NOT NULL,
                PRIMARY KEY (app_name, user_id, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("Failed to create sessions table: {}", e)))?;

        debug!("SQLite session schema initialized");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("Health check failed: {}", e)))?;
        Ok(true)
    }
}

fn encode_state(state: &SessionState) -> Result<String> {
    serde_json::to_string(state)
        .map_err(|e| Error::Internal(format!("Failed to serialize session state: {}", e)))
}

fn decode_row(row: SessionRow) -> Result<Session> {
    let (app_name, user_id, id, state, created_at, last_update_time) = row;
    let state: SessionState = serde_json::from_str(&state)
        .map_err(|e| Error::Internal(format!("Failed to deserialize session state: {}", e)))?;
    Ok(Session {
        id,
        app_name,
        user_id,
        state,
        created_at,
        last_update_time,
    })
}

#[async_trait]
impl SessionService for SqliteSessionService {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: SessionState,
    ) -> Result<Session> {
        let session = Session::new(app_name, user_id, session_id.map(str::to_string), state);
        let data = encode_state(&session.state)?;

        let result = sqlx::query(
            r#"
            INSERT INTO sessions (app_name, user_id, id, state, create_time, update_time)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(app_name, user_id, id) DO NOTHING
            "#,
        )
        .bind(&session.app_name)
        .bind(&session.user_id)
        .bind(&session.id)
        .bind(&data)
        .bind(session.created_at)
        .bind(session.last_update_time)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("Failed to create session: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Error::SessionExists(session.id));
        }

        debug!(app = %app_name, user = %user_id, session_id = %session.id, "Session created in SQLite");
        Ok(session)
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT app_name, user_id, id, state, create_time, update_time
            FROM sessions
            WHERE app_name = ? AND user_id = ? AND id = ?
            "#,
        )
        .bind(app_name)
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("Failed to get session: {}", e)))?;

        row.map(decode_row).transpose()
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        // rowid follows insertion, which is creation order
        let rows: Vec<SessionRow> = sqlx::query_as(
            r#"
            SELECT app_name, user_id, id, state, create_time, update_time
            FROM sessions
            WHERE app_name = ? AND user_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(app_name)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("Failed to list sessions: {}", e)))?;

        rows.into_iter().map(decode_row).collect()
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        let data = encode_state(&session.state)?;

        let result = sqlx::query(
            r#"
            UPDATE sessions SET state = ?, update_time = ?
            WHERE app_name = ? AND user_id = ? AND id = ?
            "#,
        )
        .bind(&data)
        .bind(session.last_update_time)
        .bind(&session.app_name)
        .bind(&session.user_id)
        .bind(&session.id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Internal(format!("Failed to save session: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Error::SessionNotFound(session.id.clone()));
        }

        debug!(session_id = %session.id, "Session saved to SQLite");
        Ok(())
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE app_name = ? AND user_id = ? AND id = ?")
                .bind(app_name)
                .bind(user_id)
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Internal(format!("Failed to delete session: {}", e)))?;

        let deleted = result.rows_affected() > 0;
        debug!(session_id = %session_id, deleted = deleted, "Session deleted from SQLite");
        Ok(deleted)
    }
}

/// Session backend configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionBackendConfig {
    /// Backend type: "sqlite" (default) or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// SQLite database path; relative paths resolve under ~/.tally
    #[serde(default = "default_sqlite_path")]
    pub path: String,
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_sqlite_path() -> String {
    "sessions.db".to_string()
}

impl Default for SessionBackendConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_sqlite_path(),
        }
    }
}

impl SessionBackendConfig {
    /// Resolve the configured SQLite path
    pub fn resolved_path(&self) -> Result<PathBuf> {
        let path = PathBuf::from(&self.path);
        if path.is_absolute() {
            return Ok(path);
        }
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Internal("Could not determine home directory".to_string()))?;
        Ok(home.join(".tally").join(path))
    }
}

/// Unified session backend wrapping the concrete services
pub enum SessionBackend {
    /// SQLite storage (default)
    Sqlite(SqliteSessionService),
    /// In-memory storage
    Memory(InMemorySessionService),
}

impl SessionBackend {
    /// Create a session backend from configuration
    pub async fn from_config(config: &SessionBackendConfig) -> Result<Self> {
        match config.backend.as_str() {
            "sqlite" => {
                let path = config.resolved_path()?;
                Ok(Self::Sqlite(SqliteSessionService::new(&path).await?))
            }
            "memory" => Ok(Self::Memory(InMemorySessionService::new())),
            other => Err(Error::Configuration(format!(
                "Unknown session backend: '{}'. Use 'sqlite' or 'memory'.",
                other
            ))),
        }
    }

    /// Whether sessions survive a restart
    #[must_use]
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Sqlite(_))
    }
}

#[async_trait]
impl SessionService for SessionBackend {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: SessionState,
    ) -> Result<Session> {
        match self {
            Self::Sqlite(s) => s.create_session(app_name, user_id, session_id, state).await,
            Self::Memory(s) => s.create_session(app_name, user_id, session_id, state).await,
        }
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        match self {
            Self::Sqlite(s) => s.get_session(app_name, user_id, session_id).await,
            Self::Memory(s) => s.get_session(app_name, user_id, session_id).await,
        }
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        match self {
            Self::Sqlite(s) => s.list_sessions(app_name, user_id).await,
            Self::Memory(s) => s.list_sessions(app_name, user_id).await,
        }
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        match self {
            Self::Sqlite(s) => s.save_session(session).await,
            Self::Memory(s) => s.save_session(session).await,
        }
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<bool> {
        match self {
            Self::Sqlite(s) => s.delete_session(app_name, user_id, session_id).await,
            Self::Memory(s) => s.delete_session(app_name, user_id, session_id).await,
        }
    }
}
