//! Reminder tools
//!
//! `add_reminder`, `view_reminders`, `update_reminder` and `delete_reminder`
//! operate on the session state handed in through [`ToolContext`].

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition, ToolResult};
use crate::reminders;
use crate::runner::elapsed_ms;
use serde::{Deserialize, Serialize};
use std::time::Instant;

fn respond<T: Serialize>(response: &T, ok: bool, message: &str, start: Instant) -> Result<ToolResult> {
    let output = serde_json::to_value(response)
        .map_err(|e| Error::Execution(format!("Failed to encode response: {}", e)))?;
    let duration = elapsed_ms(start);
    if ok {
        Ok(ToolResult::success(output, duration))
    } else {
        Ok(ToolResult::rejected(output, message, duration))
    }
}

/// Adds a reminder to the user's list
pub struct AddReminderTool {
    definition: ToolDefinition,
}

impl AddReminderTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "add_reminder",
            "Add a new reminder to the user's reminder list",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "reminder": {
                    "type": "string",
                    "description": "The reminder text to add"
                }
            },
            "required": ["reminder"]
        }))
        .with_category(ToolCategory::Memory)
        .with_state();

        Self { definition }
    }
}

impl Default for AddReminderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct AddInput {
    reminder: String,
}

#[async_trait::async_trait]
impl Tool for AddReminderTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let params: AddInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid add_reminder parameters: {}", e)))?;

        let state = ctx.state_mut(&self.definition.name)?;
        let response = reminders::add(&params.reminder, state);
        respond(&response, response.is_ok(), &response.message, start)
    }
}

/// Shows every reminder
pub struct ViewRemindersTool {
    definition: ToolDefinition,
}

impl ViewRemindersTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("view_reminders", "View all current reminders")
            .with_category(ToolCategory::Memory)
            .with_state();

        Self { definition }
    }
}

impl Default for ViewRemindersTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for ViewRemindersTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let state = ctx.state_mut(&self.definition.name)?;
        let response = reminders::view(state);
        let message = response
            .message
            .as_deref()
            .unwrap_or("Reminder list could not be read");
        respond(&response, response.is_ok(), message, start)
    }
}

/// Replaces the text of an existing reminder
pub struct UpdateReminderTool {
    definition: ToolDefinition,
}

impl UpdateReminderTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("update_reminder", "Update an existing reminder")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "The 1-based index of the reminder to update"
                    },
                    "updated_text": {
                        "type": "string",
                        "description": "The new text for the reminder"
                    }
                },
                "required": ["index", "updated_text"]
            }))
            .with_category(ToolCategory::Memory)
            .with_state();

        Self { definition }
    }
}

impl Default for UpdateReminderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct UpdateInput {
    index: i64,
    updated_text: String,
}

#[async_trait::async_trait]
impl Tool for UpdateReminderTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let params: UpdateInput = serde_json::from_value(input).map_err(|e| {
            Error::InvalidInput(format!("Invalid update_reminder parameters: {}", e))
        })?;

        let state = ctx.state_mut(&self.definition.name)?;
        let response = reminders::update(params.index, &params.updated_text, state);
        respond(&response, response.is_ok(), &response.message, start)
    }
}

/// Removes a reminder by position
pub struct DeleteReminderTool {
    definition: ToolDefinition,
}

impl DeleteReminderTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("delete_reminder", "Delete a reminder")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "index": {
                        "type": "integer",
                        "description": "The 1-based index of the reminder to delete"
                    }
                },
                "required": ["index"]
            }))
            .with_category(ToolCategory::Memory)
            .with_state();

        Self { definition }
    }
}

impl Default for DeleteReminderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct DeleteInput {
    index: i64,
}

#[async_trait::async_trait]
impl Tool for DeleteReminderTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let params: DeleteInput = serde_json::from_value(input).map_err(|e| {
            Error::InvalidInput(format!("Invalid delete_reminder parameters: {}", e))
        })?;

        let state = ctx.state_mut(&self.definition.name)?;
        let response = reminders::delete(params.index, state);
        respond(&response, response.is_ok(), &response.message, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionState;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_then_view_through_tools() {
        let mut state = SessionState::new();
        let mut ctx = ToolContext::with_state(&mut state);

        let added = AddReminderTool::new()
            .execute(json!({"reminder": "buy milk"}), &mut ctx)
            .await
            .unwrap();
        assert!(added.success);
        assert_eq!(added.output["reminder"], "buy milk");

        let viewed = ViewRemindersTool::new()
            .execute(json!({}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(viewed.output["reminders"], json!(["buy milk"]));
        assert_eq!(viewed.output["count"], 1);
    }

    #[tokio::test]
    async fn test_out_of_range_is_a_failed_result_with_payload() {
        let mut state = SessionState::new();
        let mut ctx = ToolContext::with_state(&mut state);

        let result = DeleteReminderTool::new()
            .execute(json!({"index": 1}), &mut ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output["action"], "delete_reminder");
        assert_eq!(result.output["status"], "error");
        assert_eq!(
            result.error.as_deref(),
            Some("Could not find reminder at position 1. Currently there are 0 reminders.")
        );
    }

    #[tokio::test]
    async fn test_update_through_tool() {
        let mut state = SessionState::new();
        state.insert("reminders".to_string(), json!(["a", "b"]));
        let mut ctx = ToolContext::with_state(&mut state);

        let result = UpdateReminderTool::new()
            .execute(json!({"index": 2, "updated_text": "c"}), &mut ctx)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output["old_text"], "b");
        drop(ctx);
        assert_eq!(state["reminders"], json!(["a", "c"]));
    }

    #[tokio::test]
    async fn test_view_reports_why_state_is_unreadable() {
        let mut state = SessionState::new();
        state.insert("reminders".to_string(), json!({"oops": true}));
        let mut ctx = ToolContext::with_state(&mut state);

        let result = ViewRemindersTool::new()
            .execute(json!({}), &mut ctx)
            .await
            .unwrap();
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.starts_with("State key 'reminders' does not hold a list of reminders"));
        assert_eq!(result.output["message"], error.as_str());
    }

    #[tokio::test]
    async fn test_detached_context_is_an_error() {
        let mut ctx = ToolContext::detached();
        let result = ViewRemindersTool::new().execute(json!({}), &mut ctx).await;
        assert!(matches!(result, Err(Error::MissingState(_))));
    }
}
