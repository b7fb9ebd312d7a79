//! Application configuration
//!
//! Loaded from the embedded `config/default.toml`, optional overrides in
//! `config/local.toml`, then `TALLY_*` environment variables.

mod loader;

pub use loader::load_config;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tally_core::SessionBackendConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: IdentityConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionBackendConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Who the sessions belong to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Seeded into new sessions as `user_name`
    #[serde(default)]
    pub user_name: String,
}

fn default_app_name() -> String {
    "memory_agent".to_string()
}

fn default_user_id() -> String {
    "default_user".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            user_id: default_user_id(),
            user_name: String::new(),
        }
    }
}

/// Database served by the table tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file; empty disables the table tools
    #[serde(default)]
    pub path: String,
}

impl DatabaseConfig {
    /// Configured path, if any
    pub fn path(&self) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

/// Declarative agent profile
///
/// Only `tools` affects behavior: the registry is narrowed to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instruction: String,
    /// Allowed tool names; empty allows every registered tool
    #[serde(default)]
    pub tools: Vec<String>,
}
