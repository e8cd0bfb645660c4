//! Error types for tm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Constraint violation, e.g. a duplicate primary key (D003)
    #[error("[D003] Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction state error (D004)
    #[error("[D004] Transaction error: {0}")]
    TransactionError(String),

    /// A row could not be mapped onto a record (D005)
    #[error("[D005] Row decoding failed for {table}: {message}")]
    DecodeError { table: String, message: String },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Identifier rejected before it reached SQL text (D007)
    #[error("[D007] Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Whether this error came from a uniqueness or other constraint check.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation(_))
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants for constraint
        // failures, so classify on the message prefix DuckDB uses.
        let msg = err.to_string();
        if msg.contains("Constraint Error") || msg.contains("violates primary key constraint") {
            DbError::ConstraintViolation(msg)
        } else if msg.contains("TransactionContext Error") {
            DbError::TransactionError(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
