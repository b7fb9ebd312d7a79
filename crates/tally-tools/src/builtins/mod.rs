//! Builtins - Built-in tools for Tally
//!
//! - Table tools: list_db_tables, get_table_schema, query_db_table,
//!   insert_data, delete_data
//! - Reminder tools: add_reminder, view_reminders, update_reminder,
//!   delete_reminder
//! - Utility: get_current_time

mod reminders;
mod table;
mod time;

pub use reminders::{AddReminderTool, DeleteReminderTool, UpdateReminderTool, ViewRemindersTool};
pub use table::{DeleteDataTool, InsertDataTool, ListTablesTool, QueryTableTool, TableSchemaTool};
pub use time::CurrentTimeTool;

use crate::registry::ToolRegistry;
use crate::table_store::TableStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for built-in tools
#[derive(Debug, Clone, Default)]
pub struct BuiltinsConfig {
    /// SQLite database served by the table tools (table tools are skipped when unset)
    pub database_path: Option<PathBuf>,
}

/// Register all built-in tools with the registry (default config)
pub fn register_builtins(registry: &mut ToolRegistry) {
    register_builtins_with_config(registry, &BuiltinsConfig::default());
}

/// Register all built-in tools with custom configuration
pub fn register_builtins_with_config(registry: &mut ToolRegistry, config: &BuiltinsConfig) {
    // Reminder tools (session state)
    registry.register(Arc::new(AddReminderTool::new()));
    registry.register(Arc::new(ViewRemindersTool::new()));
    registry.register(Arc::new(UpdateReminderTool::new()));
    registry.register(Arc::new(DeleteReminderTool::new()));

    registry.register(Arc::new(CurrentTimeTool::new()));

    // Table tools share one store; each call still opens its own connection
    if let Some(path) = &config.database_path {
        let store = Arc::new(TableStore::new(path));
        registry.register(Arc::new(ListTablesTool::new(store.clone())));
        registry.register(Arc::new(TableSchemaTool::new(store.clone())));
        registry.register(Arc::new(QueryTableTool::new(store.clone())));
        registry.register(Arc::new(InsertDataTool::new(store.clone())));
        registry.register(Arc::new(DeleteDataTool::new(store)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolCategory;

    #[test]
    fn test_default_registration_skips_table_tools() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);

        assert!(registry.has("add_reminder"));
        assert!(registry.has("get_current_time"));
        assert!(!registry.has("list_db_tables"));
        assert!(registry.list_by_category(ToolCategory::Database).is_empty());
    }

    #[test]
    fn test_database_path_enables_table_tools() {
        let mut registry = ToolRegistry::new();
        register_builtins_with_config(
            &mut registry,
            &BuiltinsConfig {
                database_path: Some(PathBuf::from("unused.db")),
            },
        );

        assert_eq!(registry.len(), 10);
        assert_eq!(registry.list_by_category(ToolCategory::Database).len(), 5);
        assert_eq!(registry.list_by_category(ToolCategory::Memory).len(), 4);
    }
}
