//! Session service trait and in-memory backend
//!
//! # Ordering
//!
//! `list_sessions` returns sessions in creation order. The bootstrap relies
//! on this: "the first session" means the oldest one.

use super::Session;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tally_tools::SessionState;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Session service abstracting storage backends
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session seeded with `state`
    ///
    /// Fails with `Error::SessionExists` if `session_id` is already taken.
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: SessionState,
    ) -> Result<Session>;

    /// Get a session by id
    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>>;

    /// List the sessions of (app, user) in creation order
    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>>;

    /// Persist the state of an existing session
    ///
    /// Fails with `Error::SessionNotFound` if the session was never created.
    async fn save_session(&self, session: &Session) -> Result<()>;

    /// Delete a session, returning whether it existed
    async fn delete_session(&self, app_name: &str, user_id: &str, session_id: &str)
        -> Result<bool>;
}

type UserKey = (String, String);

fn user_key(app_name: &str, user_id: &str) -> UserKey {
    (app_name.to_string(), user_id.to_string())
}

/// In-memory session service
///
/// Data is lost when the process exits. Sessions of one (app, user) pair are
/// kept in insertion order.
#[derive(Default, Clone)]
pub struct InMemorySessionService {
    sessions: Arc<RwLock<HashMap<UserKey, Vec<Session>>>>,
}

impl InMemorySessionService {
    /// Create an empty service
    #[must_use]
    pub fn new() -> Self {
        info!("Initializing in-memory session service");
        Self::default()
    }

    /// Total number of sessions across all users
    pub async fn count(&self) -> usize {
        self.sessions.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: SessionState,
    ) -> Result<Session> {
        let session = Session::new(app_name, user_id, session_id.map(str::to_string), state);

        let mut sessions = self.sessions.write().await;
        let entries = sessions.entry(user_key(app_name, user_id)).or_default();
        if entries.iter().any(|s| s.id == session.id) {
            return Err(Error::SessionExists(session.id));
        }
        entries.push(session.clone());

        debug!(app = %app_name, user = %user_id, session_id = %session.id, "Session created in memory");
        Ok(session)
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&user_key(app_name, user_id))
            .and_then(|entries| entries.iter().find(|s| s.id == session_id))
            .cloned())
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&user_key(app_name, user_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&user_key(&session.app_name, &session.user_id))
            .and_then(|entries| entries.iter_mut().find(|s| s.id == session.id))
            .ok_or_else(|| Error::SessionNotFound(session.id.clone()))?;

        stored.state = session.state.clone();
        stored.last_update_time = session.last_update_time;

        debug!(session_id = %session.id, "Session saved in memory");
        Ok(())
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        let Some(entries) = sessions.get_mut(&user_key(app_name, user_id)) else {
            return Ok(false);
        };

        let before = entries.len();
        entries.retain(|s| s.id != session_id);
        let removed = entries.len() < before;

        debug!(session_id = %session_id, removed, "Session deleted from memory");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_list() {
        let service = InMemorySessionService::new();
        assert_eq!(service.count().await, 0);

        let first = service
            .create_session("app", "user", None, SessionState::new())
            .await
            .unwrap();
        let second = service
            .create_session("app", "user", Some("fixed"), SessionState::new())
            .await
            .unwrap();
        service
            .create_session("app", "other", None, SessionState::new())
            .await
            .unwrap();

        assert_eq!(service.count().await, 3);

        let listed = service.list_sessions("app", "user").await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), "fixed"]);

        let loaded = service
            .get_session("app", "user", "fixed")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, second);

        assert!(service
            .get_session("app", "other", "fixed")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let service = InMemorySessionService::new();
        service
            .create_session("app", "user", Some("s"), SessionState::new())
            .await
            .unwrap();

        let result = service
            .create_session("app", "user", Some("s"), SessionState::new())
            .await;
        assert!(matches!(result, Err(Error::SessionExists(id)) if id == "s"));
    }

    #[tokio::test]
    async fn test_save_updates_state() {
        let service = InMemorySessionService::new();
        let mut session = service
            .create_session("app", "user", None, SessionState::new())
            .await
            .unwrap();

        session.set_state("reminders", serde_json::json!(["x"]));
        service.save_session(&session).await.unwrap();

        let loaded = service
            .get_session("app", "user", &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.get_state("reminders"), Some(&serde_json::json!(["x"])));
    }

    #[tokio::test]
    async fn test_save_unknown_session_fails() {
        let service = InMemorySessionService::new();
        let session = Session::new("app", "user", None, SessionState::new());
        let result = service.save_session(&session).await;
        assert!(matches!(result, Err(Error::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = InMemorySessionService::new();
        let session = service
            .create_session("app", "user", None, SessionState::new())
            .await
            .unwrap();

        assert!(service
            .delete_session("app", "user", &session.id)
            .await
            .unwrap());
        assert!(!service
            .delete_session("app", "user", &session.id)
            .await
            .unwrap());
        assert!(service.list_sessions("app", "user").await.unwrap().is_empty());
    }
}
