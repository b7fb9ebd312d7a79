//! Session bootstrap
//!
//! A user keeps working in their first session: if one exists it is reused,
//! otherwise a new one is created from the initial state.

use super::{Session, SessionService};
use crate::error::Result;
use tally_tools::{SessionState, REMINDERS_KEY};
use tracing::info;

/// State key holding the user's display name
pub const USER_NAME_KEY: &str = "user_name";

/// The state a fresh session starts with: the user's name and no reminders
#[must_use]
pub fn initial_state(user_name: &str) -> SessionState {
    let mut state = SessionState::new();
    state.insert(USER_NAME_KEY.to_string(), serde_json::json!(user_name));
    state.insert(REMINDERS_KEY.to_string(), serde_json::json!([]));
    state
}

/// Outcome of [`resolve_session`]
#[derive(Debug, Clone)]
pub enum Resolution {
    /// An existing session was found and reused
    Reused(Session),
    /// No session existed; this one was created
    Created(Session),
}

impl Resolution {
    /// Id of the resolved session
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session().id
    }

    /// The resolved session
    #[must_use]
    pub fn session(&self) -> &Session {
        match self {
            Self::Reused(s) | Self::Created(s) => s,
        }
    }

    /// Take the resolved session
    #[must_use]
    pub fn into_session(self) -> Session {
        match self {
            Self::Reused(s) | Self::Created(s) => s,
        }
    }

    /// Whether a new session had to be created
    #[must_use]
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Reuse the first session of (app, user) or create one seeded with `initial`
///
/// The existing session's state is returned untouched; `initial` only seeds
/// a newly created session.
pub async fn resolve_session(
    service: &dyn SessionService,
    app_name: &str,
    user_id: &str,
    initial: &SessionState,
) -> Result<Resolution> {
    let existing = service.list_sessions(app_name, user_id).await?;

    if let Some(session) = existing.into_iter().next() {
        info!(session_id = %session.id, "Continuing existing session");
        return Ok(Resolution::Reused(session));
    }

    let session = service
        .create_session(app_name, user_id, None, initial.clone())
        .await?;
    info!(session_id = %session.id, "Created new session");
    Ok(Resolution::Created(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionService;
    use serde_json::json;

    #[test]
    fn test_initial_state() {
        let state = initial_state("Ada");
        assert_eq!(state.len(), 2);
        assert_eq!(state["user_name"], json!("Ada"));
        assert_eq!(state["reminders"], json!([]));
    }

    #[tokio::test]
    async fn test_creates_then_reuses() {
        let service = InMemorySessionService::new();
        let initial = initial_state("Ada");

        let first = resolve_session(&service, "app", "user", &initial)
            .await
            .unwrap();
        assert!(first.was_created());
        assert_eq!(first.session().state, initial);

        let second = resolve_session(&service, "app", "user", &initial)
            .await
            .unwrap();
        assert!(!second.was_created());
        assert_eq!(second.session_id(), first.session_id());
    }

    #[tokio::test]
    async fn test_reuses_oldest_and_keeps_its_state() {
        let service = InMemorySessionService::new();
        let mut seeded = SessionState::new();
        seeded.insert("reminders".to_string(), json!(["existing"]));

        service
            .create_session("app", "user", Some("older"), seeded.clone())
            .await
            .unwrap();
        service
            .create_session("app", "user", Some("newer"), SessionState::new())
            .await
            .unwrap();

        let resolved = resolve_session(&service, "app", "user", &initial_state("Ada"))
            .await
            .unwrap();
        assert_eq!(resolved.session_id(), "older");
        assert_eq!(resolved.into_session().state, seeded);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let service = InMemorySessionService::new();
        let initial = initial_state("Ada");

        let a = resolve_session(&service, "app", "a", &initial).await.unwrap();
        let b = resolve_session(&service, "app", "b", &initial).await.unwrap();
        assert!(a.was_created());
        assert!(b.was_created());
        assert_ne!(a.session_id(), b.session_id());
    }
}
