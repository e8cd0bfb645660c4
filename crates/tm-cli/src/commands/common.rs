//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tm_core::ProjectConfig;
use tm_db::{Database, DuckDbBackend};
use tm_migrate::{MigrationOptions, Migrator};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing user-facing to print.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: its directory, config and resolved database path
#[derive(Debug)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: ProjectConfig,
    pub(crate) database: String,
}

/// Load the project config from the global CLI arguments.
///
/// `--config` replaces the config file lookup but provider paths still
/// resolve against `--project-dir`. `--database` is used exactly as given.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => ProjectConfig::load(Path::new(path)),
        None => ProjectConfig::load_from_dir(&root),
    }
    .context("Failed to load project config")?;

    let database = match &global.database {
        Some(path) => path.clone(),
        None => config.database_path(&root),
    };
    log::debug!("Project {} uses database {}", root.display(), database);

    Ok(Project {
        root,
        config,
        database,
    })
}

/// Open the project's DuckDB database
pub(crate) fn create_database_connection(project: &Project) -> Result<Arc<dyn Database>> {
    let db: Arc<dyn Database> = Arc::new(
        DuckDbBackend::new(&project.database)
            .with_context(|| format!("Failed to open database {}", project.database))?,
    );
    Ok(db)
}

/// Build the migration options for a project
pub(crate) fn build_options(project: &Project) -> Result<MigrationOptions> {
    MigrationOptions::from_config(&project.config, &project.root)
        .context("Invalid migration configuration")
}

/// Build a migrator over the project's database and providers
pub(crate) fn build_migrator(project: &Project, options: MigrationOptions) -> Result<Migrator> {
    let db = create_database_connection(project)?;
    Migrator::new(db, options).context("Invalid migration configuration")
}

/// Width of the widest value in a column, never narrower than its header
pub(crate) fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).max().unwrap_or(0).max(header.len())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
