//! Session record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_tools::SessionState;
use uuid::Uuid;

/// A user's session with its state mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: String,
    /// Application the session belongs to
    pub app_name: String,
    /// Owning user
    pub user_id: String,
    /// Opaque state mapping
    #[serde(default)]
    pub state: SessionState,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last state change
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    /// Create a session; a UUID v4 id is generated when `id` is `None`
    #[must_use]
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        id: Option<String>,
        state: SessionState,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            app_name: app_name.into(),
            user_id: user_id.into(),
            state,
            created_at: now,
            last_update_time: now,
        }
    }

    /// Whether this session belongs to (app, user)
    #[must_use]
    pub fn belongs_to(&self, app_name: &str, user_id: &str) -> bool {
        self.app_name == app_name && self.user_id == user_id
    }

    /// Get a state value
    #[must_use]
    pub fn get_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Set a state value
    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
        self.touch();
    }

    /// Mark the session as updated now
    pub fn touch(&mut self) {
        self.last_update_time = Utc::now();
    }
}
