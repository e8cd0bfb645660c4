//! Error types for tm-migrate

use thiserror::Error;
use tm_core::CoreError;
use tm_db::DbError;

/// Migration run errors. Every variant aborts the run; nothing from the
/// failed run is committed.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Naming convention, provider root or options problem (M001)
    #[error("[M001] Migration configuration error: {0}")]
    Configuration(#[source] CoreError),

    /// A listed script could not be loaded (M002)
    #[error("[M002] Migration script {script} could not be loaded: {source}")]
    ScriptNotFound {
        script: String,
        #[source]
        source: CoreError,
    },

    /// The database rejected a batch (M003)
    #[error("[M003] Migration {sequence_id}_{name} failed in batch {batch}: {source}")]
    Execution {
        sequence_id: i64,
        name: String,
        batch: usize,
        #[source]
        source: DbError,
    },

    /// Creating, reading or writing the history table failed (M004)
    #[error("[M004] Migration history store failed while {context}: {source}")]
    HistoryStore {
        context: String,
        #[source]
        source: DbError,
    },

    /// Opening or committing the run transaction failed (M005)
    #[error("[M005] Migration transaction failed at {stage}: {source}")]
    Transaction {
        stage: &'static str,
        #[source]
        source: DbError,
    },

    /// The blocking entry point could not start its runtime (M006)
    #[error("[M006] Failed to start migration runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    pub(crate) fn history(context: impl Into<String>, source: DbError) -> Self {
        MigrateError::HistoryStore {
            context: context.into(),
            source,
        }
    }

    /// Whether retrying without changing scripts or config can never succeed
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, MigrateError::Configuration(_))
    }
}

impl From<CoreError> for MigrateError {
    /// Listing and naming problems are configuration errors; only a script
    /// that vanished or is not text counts as a load failure. Load-time I/O
    /// failures are attributed to their script by the runner instead.
    fn from(err: CoreError) -> Self {
        let script = match &err {
            CoreError::ScriptNotFound { locator } | CoreError::ScriptNotText { locator } => {
                Some(locator.clone())
            }
            _ => None,
        };
        match script {
            Some(script) => MigrateError::ScriptNotFound {
                script,
                source: err,
            },
            None => MigrateError::Configuration(err),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
