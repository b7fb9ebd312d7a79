//! Table tools
//!
//! Expose the [`TableStore`] operations to the agent runtime:
//! `list_db_tables`, `get_table_schema`, `query_db_table`, `insert_data`
//! and `delete_data`. Each tool serializes the store's structured outcome as
//! its output; `success` mirrors the outcome's flag.

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition, ToolResult};
use crate::runner::elapsed_ms;
use crate::table_store::{RowMap, TableStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Convert a store outcome into a tool result
fn outcome_result<T: Serialize>(
    outcome: &T,
    success: bool,
    message: &str,
    start: Instant,
) -> Result<ToolResult> {
    let output = serde_json::to_value(outcome)
        .map_err(|e| Error::Execution(format!("Failed to encode outcome: {}", e)))?;
    let duration = elapsed_ms(start);
    if success {
        Ok(ToolResult::success(output, duration))
    } else {
        Ok(ToolResult::rejected(output, message, duration))
    }
}

fn parse_input<T: for<'de> Deserialize<'de>>(tool: &str, input: serde_json::Value) -> Result<T> {
    serde_json::from_value(input)
        .map_err(|e| Error::InvalidInput(format!("Invalid {} parameters: {}", tool, e)))
}

/// Lists all tables in the database
pub struct ListTablesTool {
    definition: ToolDefinition,
    store: Arc<TableStore>,
}

impl ListTablesTool {
    /// Create a new tool over `store`
    #[must_use]
    pub fn new(store: Arc<TableStore>) -> Self {
        let definition = ToolDefinition::new(
            "list_db_tables",
            "List all tables in the SQLite database",
        )
        .with_category(ToolCategory::Database);

        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for ListTablesTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        _ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let outcome = self.store.list_tables().await;
        outcome_result(&outcome, outcome.success, &outcome.message, start)
    }
}

#[derive(Debug, Deserialize)]
struct TableInput {
    table_name: String,
}

/// Returns the column names and types of a table
pub struct TableSchemaTool {
    definition: ToolDefinition,
    store: Arc<TableStore>,
}

impl TableSchemaTool {
    /// Create a new tool over `store`
    #[must_use]
    pub fn new(store: Arc<TableStore>) -> Self {
        let definition = ToolDefinition::new(
            "get_table_schema",
            "Get the schema (column names and types) of a specific table",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to describe"
                }
            },
            "required": ["table_name"]
        }))
        .with_category(ToolCategory::Database);

        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for TableSchemaTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let params: TableInput = parse_input("get_table_schema", input)?;
        let outcome = self.store.get_table_schema(&params.table_name).await;
        outcome_result(&outcome, outcome.success, &outcome.message, start)
    }
}

#[derive(Debug, Deserialize)]
struct QueryInput {
    table_name: String,
    #[serde(default)]
    columns: Option<String>,
    #[serde(default)]
    condition: Option<String>,
}

/// Reads rows from a table with an optional WHERE clause
pub struct QueryTableTool {
    definition: ToolDefinition,
    store: Arc<TableStore>,
}

impl QueryTableTool {
    /// Create a new tool over `store`
    #[must_use]
    pub fn new(store: Arc<TableStore>) -> Self {
        let definition = ToolDefinition::new(
            "query_db_table",
            "Query a table with an optional condition. Returns a list of rows.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "The name of the table to query"
                },
                "columns": {
                    "type": "string",
                    "description": "Comma-separated list of columns to retrieve (e.g. \"id, name\"). Defaults to \"*\"."
                },
                "condition": {
                    "type": "string",
                    "description": "Optional SQL WHERE clause condition (e.g. \"id = 1\" or \"completed = 0\")"
                }
            },
            "required": ["table_name"]
        }))
        .with_category(ToolCategory::Database);

        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for QueryTableTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let params: QueryInput = parse_input("query_db_table", input)?;
        let outcome = self
            .store
            .query_table(
                &params.table_name,
                params.columns.as_deref(),
                params.condition.as_deref(),
            )
            .await;
        outcome_result(&outcome, outcome.success, &outcome.message, start)
    }
}

#[derive(Debug, Deserialize)]
struct InsertInput {
    table_name: String,
    data: RowMap,
}

/// Inserts one row into a table
pub struct InsertDataTool {
    definition: ToolDefinition,
    store: Arc<TableStore>,
}

impl InsertDataTool {
    /// Create a new tool over `store`
    #[must_use]
    pub fn new(store: Arc<TableStore>) -> Self {
        let definition = ToolDefinition::new(
            "insert_data",
            "Insert a new row of data into the specified table. \
             The result includes the ID of the newly inserted row.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "The name of the table to insert data into"
                },
                "data": {
                    "type": "object",
                    "description": "Column names mapped to the values of the new row"
                }
            },
            "required": ["table_name", "data"]
        }))
        .with_category(ToolCategory::Database);

        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for InsertDataTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let params: InsertInput = parse_input("insert_data", input)?;
        let outcome = self.store.insert_row(&params.table_name, &params.data).await;
        outcome_result(&outcome, outcome.success, &outcome.message, start)
    }
}

#[derive(Debug, Deserialize)]
struct DeleteInput {
    table_name: String,
    #[serde(default)]
    condition: String,
}

/// Deletes the rows of a table that match a WHERE clause
pub struct DeleteDataTool {
    definition: ToolDefinition,
    store: Arc<TableStore>,
}

impl DeleteDataTool {
    /// Create a new tool over `store`
    #[must_use]
    pub fn new(store: Arc<TableStore>) -> Self {
        let definition = ToolDefinition::new(
            "delete_data",
            "Delete rows from a table based on a SQL WHERE clause condition. \
             The condition must not be empty.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "The name of the table to delete data from"
                },
                "condition": {
                    "type": "string",
                    "description": "SQL WHERE clause selecting the rows to delete. Must not be empty."
                }
            },
            "required": ["table_name", "condition"]
        }))
        .with_category(ToolCategory::Database);

        Self { definition, store }
    }
}

#[async_trait::async_trait]
impl Tool for DeleteDataTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &mut ToolContext<'_>,
    ) -> Result<ToolResult> {
        let start = Instant::now();
        let params: DeleteInput = parse_input("delete_data", input)?;
        let outcome = self
            .store
            .delete_rows(&params.table_name, &params.condition)
            .await;
        outcome_result(&outcome, outcome.success, &outcome.message, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (Arc<TableStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(TableStore::new(temp_dir.path().join("tools.db")));
        (store, temp_dir)
    }

    #[test]
    fn test_definitions() {
        let (store, _temp) = store();
        let query = QueryTableTool::new(store.clone());
        assert_eq!(query.definition().name, "query_db_table");
        assert_eq!(query.definition().required_parameters(), vec!["table_name"]);

        let delete = DeleteDataTool::new(store);
        assert_eq!(
            delete.definition().required_parameters(),
            vec!["table_name", "condition"]
        );
        assert_eq!(delete.definition().category, ToolCategory::Database);
    }

    #[tokio::test]
    async fn test_insert_tool_rejects_empty_data() {
        let (store, _temp) = store();
        let tool = InsertDataTool::new(store);
        let mut ctx = ToolContext::detached();

        let result = tool
            .execute(json!({"table_name": "tasks", "data": {}}), &mut ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output["success"], false);
        assert_eq!(result.output["failure"], "rejected");
        assert_eq!(
            result.error.as_deref(),
            Some("No data provided for insertion.")
        );
    }

    #[tokio::test]
    async fn test_schema_tool_not_found() {
        let (store, _temp) = store();
        let tool = TableSchemaTool::new(store);
        let mut ctx = ToolContext::detached();

        let result = tool
            .execute(json!({"table_name": "nonexistent_table"}), &mut ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output["failure"], "not_found");
    }

    #[tokio::test]
    async fn test_list_tool_succeeds_on_empty_database() {
        let (store, _temp) = store();
        let tool = ListTablesTool::new(store);
        let mut ctx = ToolContext::detached();

        let result = tool.execute(json!({}), &mut ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output["tables"], json!([]));
    }

    #[tokio::test]
    async fn test_bad_parameters_are_invalid_input() {
        let (store, _temp) = store();
        let tool = InsertDataTool::new(store);
        let mut ctx = ToolContext::detached();

        let result = tool
            .execute(json!({"table_name": "tasks", "data": [1, 2]}), &mut ctx)
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
