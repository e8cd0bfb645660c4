//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// S001: Sequence id part of a script key is not a non-negative integer
    #[error("[S001] Invalid sequence id '{value}' in script '{key}': expected digits before the first '_'")]
    InvalidSequenceId { key: String, value: String },

    /// S002: Script key does not follow `<sequenceId>_<name>.sql`
    #[error("[S002] Malformed script name '{key}': {reason}")]
    MalformedScriptKey { key: String, reason: String },

    /// S003: Provider root is empty or unusable
    #[error("[S003] Invalid provider root '{root}': {reason}")]
    InvalidProviderRoot { root: String, reason: String },

    /// S004: Two scripts share one sequence id
    #[error("[S004] Duplicate sequence id {sequence_id}: '{first}' and '{second}'")]
    DuplicateSequenceId {
        sequence_id: i64,
        first: String,
        second: String,
    },

    /// S005: Listed script could not be loaded
    #[error("[S005] Migration script not found: {locator}")]
    ScriptNotFound { locator: String },

    /// S006: Script content is not valid UTF-8 text
    #[error("[S006] Migration script is not valid UTF-8: {locator}")]
    ScriptNotText { locator: String },

    /// IO error with file path context
    #[error("IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the error is a naming or configuration problem that must be
    /// fixed by whoever wrote the scripts or the config.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            CoreError::ScriptNotFound { .. } | CoreError::IoWithPath { .. }
        )
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ConfigParseError {
            message: err.to_string(),
        }
    }
}
