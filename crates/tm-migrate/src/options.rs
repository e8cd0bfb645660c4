//! Static configuration of a migration run.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tm_core::{BatchSplitter, CoreError, CoreResult, FilesystemProvider, ProjectConfig, ScriptProvider};
use tm_db::record::validate_identifier;

/// Default name of the history table
pub const DEFAULT_HISTORY_TABLE: &str = "migration_history";

/// Everything a [`Migrator`](crate::Migrator) needs besides the database.
///
/// Built once, explicitly, and never mutated after being handed to the
/// runner. Providers keep their registration order.
#[derive(Clone)]
pub struct MigrationOptions {
    history_table: String,
    providers: Vec<Arc<dyn ScriptProvider>>,
    splitter: BatchSplitter,
    origin_info: String,
}

impl fmt::Debug for MigrationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<String> = self.providers.iter().map(|p| p.describe()).collect();
        f.debug_struct("MigrationOptions")
            .field("history_table", &self.history_table)
            .field("providers", &providers)
            .field("separator", &self.splitter.separator())
            .field("origin_info", &self.origin_info)
            .finish()
    }
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_TABLE)
    }
}

impl MigrationOptions {
    /// Options with no providers, the default `GO` separator and a
    /// process-derived origin description.
    pub fn new(history_table: impl Into<String>) -> Self {
        Self {
            history_table: history_table.into(),
            providers: Vec::new(),
            splitter: BatchSplitter::default(),
            origin_info: default_origin_info(),
        }
    }

    /// Register a provider after the ones already registered
    pub fn with_provider(self, provider: impl ScriptProvider + 'static) -> Self {
        self.with_shared_provider(Arc::new(provider))
    }

    /// Register an already shared provider
    pub fn with_shared_provider(mut self, provider: Arc<dyn ScriptProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_batch_splitter(mut self, splitter: BatchSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_origin_info(mut self, origin_info: impl Into<String>) -> Self {
        self.origin_info = origin_info.into();
        self
    }

    /// Build options from a loaded project config, resolving provider
    /// directories against `root`.
    pub fn from_config(config: &ProjectConfig, root: &Path) -> CoreResult<Self> {
        let mut options = Self::new(config.history_table.clone())
            .with_batch_splitter(BatchSplitter::new(config.batch_separator.clone())?);
        if let Some(origin) = &config.origin_info {
            options = options.with_origin_info(origin.clone());
        }
        for dir in config.provider_paths_absolute(root) {
            options = options.with_provider(FilesystemProvider::new(dir)?);
        }
        Ok(options)
    }

    /// Reject options a run could never succeed with
    pub fn validate(&self) -> CoreResult<()> {
        if self.providers.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "no migration providers configured".to_string(),
            });
        }
        validate_identifier(&self.history_table).map_err(|_| CoreError::ConfigInvalid {
            message: format!(
                "history table '{}' is not a valid SQL identifier",
                self.history_table
            ),
        })
    }

    pub fn history_table(&self) -> &str {
        &self.history_table
    }

    pub fn providers(&self) -> &[Arc<dyn ScriptProvider>] {
        &self.providers
    }

    pub fn splitter(&self) -> &BatchSplitter {
        &self.splitter
    }

    pub fn origin_info(&self) -> &str {
        &self.origin_info
    }
}

fn default_origin_info() -> String {
    let host = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string());
    format!(
        "tidemark {} on {} (pid {})",
        env!("CARGO_PKG_VERSION"),
        host,
        std::process::id()
    )
}

#[cfg(test)]
#[path = "options_test.rs"]
mod tests;
