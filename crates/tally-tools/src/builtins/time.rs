//! Current time tool

use crate::context::ToolContext;
use crate::error::Result;
use crate::registry::{Tool, ToolCategory, ToolDefinition, ToolResult};
use crate::runner::elapsed_ms;
use chrono::Local;
use std::time::Instant;

/// Format used for `current_time`
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the local time as `YYYY-MM-DD HH:MM:SS`
pub struct CurrentTimeTool {
    definition: ToolDefinition,
}

impl CurrentTimeTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "get_current_time",
            "Get the current time in the format YYYY-MM-DD HH:MM:SS",
        )
        .with_category(ToolCategory::Utility);

        Self { definition }
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for CurrentTimeTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        _ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let now = Local::now().format(TIME_FORMAT).to_string();
        Ok(ToolResult::success(
            serde_json::json!({ "current_time": now }),
            elapsed_ms(start),
        ))
    }
}
