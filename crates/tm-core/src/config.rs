//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use crate::splitter::{BatchSplitter, DEFAULT_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File names searched for in a project directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["tidemark.yml", "tidemark.yaml"];

/// Main project configuration from tidemark.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Target database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Table holding applied-migration history; the identifier is checked
    /// when migration options are validated
    #[serde(default = "default_history_table")]
    pub history_table: String,

    /// Line token separating batches inside one script
    #[serde(default = "default_batch_separator")]
    pub batch_separator: String,

    /// Free-text description of the process running migrations, stored in history
    #[serde(default)]
    pub origin_info: Option<String>,

    /// Script sources, in registration order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Run-once gate for the HTTP trigger
    #[serde(default)]
    pub gate: GateConfig,

    /// HTTP trigger listener
    #[serde(default)]
    pub server: ServerConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// One configured script source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Directory of `.sql` files, relative to the project directory
    Filesystem { path: String },
}

/// Run-once gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Seconds a run attempt suppresses further HTTP-triggered runs
    #[serde(default = "default_gate_window_secs")]
    pub window_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            window_secs: default_gate_window_secs(),
        }
    }
}

impl GateConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// HTTP trigger listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_history_table() -> String {
    "migration_history".to_string()
}

fn default_batch_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_gate_window_secs() -> u64 {
    120
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8088
}

impl ProjectConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a project directory
    /// Looks for tidemark.yml or tidemark.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: ProjectConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.providers.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one migration provider must be configured".to_string(),
            });
        }

        for provider in &self.providers {
            match provider {
                ProviderConfig::Filesystem { path } if path.trim().is_empty() => {
                    return Err(CoreError::ConfigInvalid {
                        message: "Filesystem provider path cannot be empty".to_string(),
                    });
                }
                ProviderConfig::Filesystem { .. } => {}
            }
        }

        BatchSplitter::new(self.batch_separator.clone())?;

        if self.gate.window_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "gate.window_secs must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Filesystem provider directories resolved against a project root
    pub fn provider_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.providers
            .iter()
            .map(|p| match p {
                ProviderConfig::Filesystem { path } => root.join(path),
            })
            .collect()
    }

    /// Database path resolved against a project root (`:memory:` is kept as is)
    pub fn database_path(&self, root: &Path) -> String {
        if self.database.path == DEFAULT_DB_PATH {
            self.database.path.clone()
        } else {
            root.join(&self.database.path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
