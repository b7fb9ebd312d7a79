//! Registry - Tool registration and discovery
//!
//! Tools are registered with a JSON-schema definition that the external
//! agent runtime uses to build its calling contract. Definitions are plain
//! data; nothing is inferred from Rust signatures.

use crate::context::ToolContext;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Tool category for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Relational table access
    Database,
    /// Session-state backed memory (reminders)
    Memory,
    /// Utility operations
    Utility,
}

impl ToolCategory {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Memory => "memory",
            Self::Utility => "utility",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tool metadata and schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: serde_json::Value,
    /// Tool category
    pub category: ToolCategory,
    /// Whether the tool is enabled
    pub enabled: bool,
    /// Whether the tool reads or writes session state
    #[serde(default)]
    pub uses_state: bool,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            category: ToolCategory::Utility,
            enabled: true,
            uses_state: false,
        }
    }

    /// Set the parameters schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    /// Set enabled status
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Mark the tool as reading or writing session state
    #[must_use]
    pub fn with_state(mut self) -> Self {
        self.uses_state = true;
        self
    }

    /// Names listed under `required` in the parameters schema
    #[must_use]
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Output data
    pub output: serde_json::Value,
    /// Error message if failed
    pub error: Option<String>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a successful result
    #[must_use]
    pub fn success(output: serde_json::Value, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration_ms,
        }
    }

    /// Create a failed result
    #[must_use]
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Create a failed result that still carries a structured payload
    #[must_use]
    pub fn rejected(
        output: serde_json::Value,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: false,
            output,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// Trait for tool implementations
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with given input and invocation context
    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult>;

    /// Validate input before execution
    ///
    /// The default checks that the input is an object and that every
    /// parameter marked `required` in the schema is present.
    fn validate_input(&self, input: &serde_json::Value) -> Result<()> {
        let Some(object) = input.as_object() else {
            return Err(Error::InvalidInput("Input must be an object".to_string()));
        };

        let missing: Vec<&str> = self
            .definition()
            .required_parameters()
            .into_iter()
            .filter(|name| !object.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "missing required parameter(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

/// Registry for managing tools
///
/// Backed by ordered maps so that listings are stable across runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    definitions: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let def = tool.definition();
        let name = def.name.clone();
        debug!(tool = %name, category = %def.category, "Registering tool");
        self.definitions.insert(name.clone(), def.clone());
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get a tool definition by name
    #[must_use]
    pub fn get_definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.get(name)
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// List all tool definitions
    #[must_use]
    pub fn list_definitions(&self) -> Vec<&ToolDefinition> {
        self.definitions.values().collect()
    }

    /// List enabled tool definitions
    #[must_use]
    pub fn list_enabled(&self) -> Vec<&ToolDefinition> {
        self.definitions.values().filter(|d| d.enabled).collect()
    }

    /// List tools by category
    #[must_use]
    pub fn list_by_category(&self, category: ToolCategory) -> Vec<&ToolDefinition> {
        self.definitions
            .values()
            .filter(|d| d.category == category)
            .collect()
    }

    /// Enable a tool
    pub fn enable(&mut self, name: &str) -> bool {
        if let Some(def) = self.definitions.get_mut(name) {
            def.enabled = true;
            true
        } else {
            false
        }
    }

    /// Disable a tool
    pub fn disable(&mut self, name: &str) -> bool {
        if let Some(def) = self.definitions.get_mut(name) {
            def.enabled = false;
            true
        } else {
            false
        }
    }

    /// Disable every tool not named in `allowed`
    ///
    /// Returns the names from `allowed` that are not registered.
    pub fn restrict_to<S: AsRef<str>>(&mut self, allowed: &[S]) -> Vec<String> {
        let allowed: HashSet<&str> = allowed.iter().map(AsRef::as_ref).collect();
        for (name, def) in self.definitions.iter_mut() {
            def.enabled = allowed.contains(name.as_str());
        }
        let mut unknown: Vec<String> = allowed
            .into_iter()
            .filter(|name| !self.tools.contains_key(*name))
            .map(str::to_string)
            .collect();
        unknown.sort();
        unknown
    }

    /// Get tool count
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Export enabled definitions in the function-calling shape agent
    /// runtimes expect (`name`, `description`, `parameters`)
    #[must_use]
    pub fn to_function_specs(&self) -> Vec<serde_json::Value> {
        self.list_enabled()
            .into_iter()
            .map(|def| {
                serde_json::json!({
                    "name": def.name,
                    "description": def.description,
                    "parameters": def.parameters,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool {
        definition: ToolDefinition,
    }

    impl EchoTool {
        fn new(name: &str) -> Self {
            Self {
                definition: ToolDefinition::new(name, "Echo the input").with_parameters(
                    serde_json::json!({
                        "type": "object",
                        "properties": {"text": {"type": "string"}},
                        "required": ["text"]
                    }),
                ),
            }
        }
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(
            &self,
            input: serde_json::Value,
            _ctx: &mut ToolContext<'_>,
        ) -> Result<ToolResult> {
            Ok(ToolResult::success(input, 0))
        }
    }

    #[test]
    fn test_tool_definition_builder() {
        let def = ToolDefinition::new("test_tool", "A test tool")
            .with_category(ToolCategory::Memory)
            .with_state();

        assert_eq!(def.name, "test_tool");
        assert_eq!(def.category, ToolCategory::Memory);
        assert!(def.uses_state);
        assert!(def.enabled);
        assert!(def.required_parameters().is_empty());
    }

    #[test]
    fn test_tool_result() {
        let success = ToolResult::success(serde_json::json!({"data": "test"}), 100);
        assert!(success.success);
        assert!(success.error.is_none());

        let failure = ToolResult::failure("boom", 5);
        assert!(!failure.success);
        assert_eq!(failure.error.as_deref(), Some("boom"));
        assert!(failure.output.is_null());

        let rejected = ToolResult::rejected(serde_json::json!({"status": "error"}), "bad", 0);
        assert!(!rejected.success);
        assert_eq!(rejected.output["status"], "error");
    }

    #[test]
    fn test_default_validation_checks_required() {
        let tool = EchoTool::new("echo");
        assert!(tool.validate_input(&serde_json::json!({"text": "hi"})).is_ok());
        assert!(matches!(
            tool.validate_input(&serde_json::json!({})),
            Err(Error::InvalidInput(msg)) if msg.contains("text")
        ));
        assert!(tool.validate_input(&serde_json::json!("hi")).is_err());
    }

    #[test]
    fn test_registry_listing_is_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new("zeta")));
        registry.register(Arc::new(EchoTool::new("alpha")));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list_names(), vec!["alpha", "zeta"]);
        assert!(registry.has("alpha"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_restrict_to_disables_others() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new("a")));
        registry.register(Arc::new(EchoTool::new("b")));

        let unknown = registry.restrict_to(&["a", "ghost"]);
        assert_eq!(unknown, vec!["ghost".to_string()]);

        let enabled: Vec<&str> = registry
            .list_enabled()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["a"]);

        let specs = registry.to_function_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0]["name"], "a");
    }

    #[test]
    fn test_enable_disable() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new("a")));

        assert!(registry.disable("a"));
        assert!(registry.list_enabled().is_empty());
        assert!(registry.enable("a"));
        assert_eq!(registry.list_enabled().len(), 1);
        assert!(!registry.enable("missing"));
    }
}
