//! Dispatch - running tools against a session
//!
//! A call loads the session, hands a working copy of its state to the tool,
//! and writes the state back only when the tool changed it. Calls are
//! serialized so two tools never edit the same state concurrently.

use crate::error::{Error, Result};
use crate::session::SessionService;
use std::sync::Arc;
use tally_tools::{ToolContext, ToolResult, ToolRunner};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Runs tools for one (app, user) pair against stored sessions
pub struct Dispatcher {
    service: Arc<dyn SessionService>,
    runner: ToolRunner,
    app_name: String,
    user_id: String,
    lock: Mutex<()>,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(
        service: Arc<dyn SessionService>,
        runner: ToolRunner,
        app_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            runner,
            app_name: app_name.into(),
            user_id: user_id.into(),
            lock: Mutex::new(()),
        }
    }

    /// The tool runner
    #[must_use]
    pub fn runner(&self) -> &ToolRunner {
        &self.runner
    }

    /// The session service
    #[must_use]
    pub fn service(&self) -> &Arc<dyn SessionService> {
        &self.service
    }

    /// Run `tool_name` with `input` against the state of `session_id`
    ///
    /// Tool failures come back as a failed [`ToolResult`]; unknown sessions,
    /// unknown or disabled tools and storage problems are errors.
    #[instrument(skip(self, input), fields(app = %self.app_name, user = %self.user_id))]
    pub async fn call(
        &self,
        session_id: &str,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<ToolResult> {
        let _guard = self.lock.lock().await;

        let mut session = self
            .service
            .get_session(&self.app_name, &self.user_id, session_id)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        let mut state = session.state.clone();
        let execution = {
            let mut ctx = ToolContext::with_state(&mut state);
            self.runner.execute(tool_name, input, &mut ctx).await?
        };

        if state != session.state {
            session.state = state;
            session.touch();
            self.service.save_session(&session).await?;
            debug!(session_id = %session_id, tool = %tool_name, "Session state saved");
        }

        Ok(execution.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{initial_state, InMemorySessionService};
    use serde_json::json;
    use tally_tools::{register_builtins, ToolRegistry};

    async fn setup() -> (Dispatcher, String) {
        let service = Arc::new(InMemorySessionService::new());
        let session = service
            .create_session("app", "user", None, initial_state("Ada"))
            .await
            .unwrap();

        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let runner = ToolRunner::new(Arc::new(registry));

        (Dispatcher::new(service, runner, "app", "user"), session.id)
    }

    #[tokio::test]
    async fn test_state_changes_are_saved() {
        let (dispatcher, id) = setup().await;

        let added = dispatcher
            .call(&id, "add_reminder", json!({"reminder": "call mom"}))
            .await
            .unwrap();
        assert!(added.success);

        let session = dispatcher
            .service()
            .get_session("app", "user", &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.state["reminders"], json!(["call mom"]));
        assert_eq!(session.state["user_name"], json!("Ada"));
    }

    #[tokio::test]
    async fn test_failed_tool_leaves_state_alone() {
        let (dispatcher, id) = setup().await;
        let before = dispatcher
            .service()
            .get_session("app", "user", &id)
            .await
            .unwrap()
            .unwrap();

        let result = dispatcher
            .call(&id, "delete_reminder", json!({"index": 3}))
            .await
            .unwrap();
        assert!(!result.success);

        let after = dispatcher
            .service()
            .get_session("app", "user", &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (dispatcher, _id) = setup().await;
        let result = dispatcher.call("nope", "view_reminders", json!({})).await;
        assert!(matches!(result, Err(Error::SessionNotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (dispatcher, id) = setup().await;
        let result = dispatcher.call(&id, "launch_rockets", json!({})).await;
        assert!(matches!(
            result,
            Err(Error::Tool(tally_tools::Error::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_tool_outside_allow_list_is_denied() {
        let service = Arc::new(InMemorySessionService::new());
        let session = service
            .create_session("app", "user", None, initial_state("Ada"))
            .await
            .unwrap();

        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        registry.restrict_to(&["view_reminders"]);
        let dispatcher = Dispatcher::new(
            service,
            ToolRunner::new(Arc::new(registry)),
            "app",
            "user",
        );

        let result = dispatcher
            .call(&session.id, "add_reminder", json!({"reminder": "sneaky"}))
            .await;
        assert!(matches!(
            result,
            Err(Error::Tool(tally_tools::Error::PermissionDenied(_)))
        ));

        let stored = dispatcher
            .service()
            .get_session("app", "user", &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state["reminders"], json!([]));

        let viewed = dispatcher
            .call(&session.id, "view_reminders", json!({}))
            .await
            .unwrap();
        assert!(viewed.success);
    }

    #[tokio::test]
    async fn test_stateless_tool() {
        let (dispatcher, id) = setup().await;
        let result = dispatcher
            .call(&id, "get_current_time", json!({}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output["current_time"].is_string());
    }
}
