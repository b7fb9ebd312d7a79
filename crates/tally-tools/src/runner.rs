//! Runner - Tool execution engine
//!
//! The runner is the tool-dispatch boundary: it looks a tool up, checks that
//! it is enabled, validates the input and executes it. Validation and
//! execution failures come back as failed `ToolResult`s so that the agent
//! runtime always receives a structured answer; only lookup and permission
//! problems are returned as errors.

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{ToolRegistry, ToolResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Options for a single tool execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Skip validation
    pub skip_validation: bool,
    /// Dry run (validate but don't execute)
    pub dry_run: bool,
}

impl ExecutionOptions {
    /// Create dry-run options
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }
}

/// Tool execution result with additional metadata
#[derive(Debug)]
pub struct ExecutionResult {
    /// The tool result
    pub result: ToolResult,
    /// Tool name
    pub tool_name: String,
    /// Whether this was a dry run
    pub dry_run: bool,
}

/// Tool runner
#[derive(Clone)]
pub struct ToolRunner {
    registry: Arc<ToolRegistry>,
}

impl ToolRunner {
    /// Create a new tool runner
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute a tool by name
    pub async fn execute(
        &self,
        tool_name: &str,
        input: serde_json::Value,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ExecutionResult> {
        self.execute_with_options(tool_name, input, ctx, ExecutionOptions::default())
            .await
    }

    /// Execute a tool with custom options
    #[instrument(skip(self, input, ctx, options), fields(tool = %tool_name))]
    pub async fn execute_with_options(
        &self,
        tool_name: &str,
        input: serde_json::Value,
        ctx: &mut ToolContext<'_>,
        options: ExecutionOptions,
    ) -> Result<ExecutionResult> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| Error::NotFound(tool_name.to_string()))?;

        // The registry's copy carries enable/disable and allow-list changes
        let enabled = self
            .registry
            .get_definition(tool_name)
            .map_or(false, |def| def.enabled);

        if !enabled {
            warn!(tool = %tool_name, "Disabled tool invoked");
            return Err(Error::PermissionDenied(format!(
                "Tool '{}' is disabled",
                tool_name
            )));
        }

        let start = Instant::now();

        if !options.skip_validation {
            if let Err(e) = tool.validate_input(&input) {
                warn!(tool = %tool_name, error = %e, "Tool input rejected");
                return Ok(ExecutionResult {
                    result: ToolResult::failure(e.to_string(), elapsed_ms(start)),
                    tool_name: tool_name.to_string(),
                    dry_run: options.dry_run,
                });
            }
        }

        if options.dry_run {
            debug!(tool = %tool_name, "Dry run - skipping execution");
            return Ok(ExecutionResult {
                result: ToolResult::success(
                    serde_json::json!({
                        "dry_run": true,
                        "would_execute": tool_name,
                        "input": input
                    }),
                    0,
                ),
                tool_name: tool_name.to_string(),
                dry_run: true,
            });
        }

        debug!(tool = %tool_name, "Executing tool");

        let result = match tool.execute(input, ctx).await {
            Ok(result) => result,
            Err(e) => {
                error!(tool = %tool_name, error = %e, "Tool execution failed");
                ToolResult::failure(e.to_string(), elapsed_ms(start))
            }
        };

        debug!(
            tool = %tool_name,
            success = %result.success,
            duration_ms = %result.duration_ms,
            "Tool execution completed"
        );

        Ok(ExecutionResult {
            result,
            tool_name: tool_name.to_string(),
            dry_run: false,
        })
    }

    /// Execute multiple tools in sequence against the same context
    ///
    /// Stops at the first lookup or permission error.
    pub async fn execute_sequence(
        &self,
        calls: Vec<(String, serde_json::Value)>,
        ctx: &mut ToolContext<'_>,
    ) -> Vec<Result<ExecutionResult>> {
        let mut results = Vec::with_capacity(calls.len());

        for (tool_name, input) in calls {
            let result = self.execute(&tool_name, input, ctx).await;
            let should_stop = result.is_err();
            results.push(result);

            if should_stop {
                break;
            }
        }

        results
    }

    /// Check if a tool can be executed (without actually executing)
    pub fn can_execute(&self, tool_name: &str) -> Result<bool> {
        let definition = self
            .registry
            .get_definition(tool_name)
            .ok_or_else(|| Error::NotFound(tool_name.to_string()))?;
        Ok(definition.enabled)
    }
}

/// Milliseconds elapsed since `start`
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
