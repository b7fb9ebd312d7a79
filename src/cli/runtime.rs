//! Wiring shared by the commands: config, tool runner and session service

use crate::config::{load_config, AppConfig};
use anyhow::{Context, Result};
use std::sync::Arc;
use tally_core::{
    initial_state, resolve_session, Dispatcher, Resolution, SessionBackend, SessionService,
};
use tally_tools::{register_builtins_with_config, BuiltinsConfig, ToolRegistry, ToolRunner};
use tracing::{info, warn};

pub struct Runtime {
    pub config: AppConfig,
    pub service: Arc<SessionBackend>,
}

impl Runtime {
    pub async fn load() -> Result<Self> {
        let config = load_config()?;
        let service = SessionBackend::from_config(&config.session)
            .await
            .context("Failed to open session store")?;
        if !service.is_durable() {
            warn!("In-memory session backend: state is lost when tally exits");
        }
        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    pub async fn resolve(&self) -> Result<Resolution> {
        let initial = initial_state(&self.config.app.user_name);
        let resolution = resolve_session(
            self.service.as_ref(),
            &self.config.app.name,
            &self.config.app.user_id,
            &initial,
        )
        .await
        .context("Failed to resolve session")?;
        Ok(resolution)
    }

    pub fn dispatcher(&self) -> Dispatcher {
        let service: Arc<dyn SessionService> = self.service.clone();
        Dispatcher::new(
            service,
            build_runner(&self.config),
            &self.config.app.name,
            &self.config.app.user_id,
        )
    }
}

/// Register the builtins and narrow them to the agent's allow-list
pub fn build_runner(config: &AppConfig) -> ToolRunner {
    let mut registry = ToolRegistry::new();
    let builtins = BuiltinsConfig {
        database_path: config.database.path(),
    };
    register_builtins_with_config(&mut registry, &builtins);

    if !config.agent.tools.is_empty() {
        let unknown = registry.restrict_to(&config.agent.tools);
        for name in unknown {
            warn!(tool = %name, agent = %config.agent.name, "Allowed tool is not registered");
        }
    }

    info!(
        agent = %config.agent.name,
        enabled = registry.list_enabled().len(),
        registered = registry.len(),
        "Tool registry ready"
    );
    ToolRunner::new(Arc::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_tools_need_a_database() {
        let config = AppConfig::default();
        let runner = build_runner(&config);
        assert!(runner.registry().has("add_reminder"));
        assert!(!runner.registry().has("list_db_tables"));
    }

    #[test]
    fn test_allow_list_narrows_registry() {
        let mut config = AppConfig::default();
        config.database.path = "tasks.db".to_string();
        config.agent.tools = vec!["view_reminders".to_string(), "query_db_table".to_string()];

        let runner = build_runner(&config);
        let enabled: Vec<&str> = runner
            .registry()
            .list_enabled()
            .into_iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["query_db_table", "view_reminders"]);
        assert!(!runner.can_execute("add_reminder").unwrap());
    }
}
