//! Database trait definitions

use crate::error::DbResult;
use crate::record::Value;
use async_trait::async_trait;

/// Database abstraction trait for Tidemark
///
/// Implementations must be Send + Sync for async operation. Migration runs
/// only call [`connect`](Self::connect) and work through the [`Session`];
/// the statement methods below run outside any session and exist for
/// setup, diagnostics and tests.
#[async_trait]
pub trait Database: Send + Sync {
    /// Open a new session with its own connection.
    ///
    /// Sessions are never shared, so two concurrent migration runs never
    /// observe each other's open transaction.
    async fn connect(&self) -> DbResult<Box<dyn Session>>;

    /// Execute SQL outside any session, returns affected rows (diagnostics and tests)
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements outside any session (setup and tests)
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Check if a table or view exists, as seen by committed data (diagnostics and tests)
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Execute query returning row count (for tests)
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// One connection plus at most one open transaction.
///
/// Everything executed through a session while a transaction is open
/// belongs to that transaction. Dropping a session with an open
/// transaction rolls it back.
#[async_trait]
pub trait Session: Send {
    /// Execute a single SQL statement, returns affected rows
    async fn execute(&mut self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&mut self, sql: &str) -> DbResult<()>;

    /// Check if a table or view exists (schema-qualified names allowed)
    async fn relation_exists(&mut self, name: &str) -> DbResult<bool>;

    /// Open a transaction; fails if one is already open
    async fn begin(&mut self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&mut self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&mut self) -> DbResult<()>;

    /// Whether a transaction is currently open
    fn in_transaction(&self) -> bool;

    /// Insert one row, values bound positionally to `columns`
    async fn insert_row(&mut self, table: &str, columns: &[&str], values: Vec<Value>)
        -> DbResult<()>;

    /// Update the row whose `key_column` equals `key`, returns affected rows
    async fn update_row(
        &mut self,
        table: &str,
        key_column: &str,
        key: Value,
        columns: &[&str],
        values: Vec<Value>,
    ) -> DbResult<usize>;

    /// Select `columns` ordered by `order_by`, optionally descending and limited
    async fn select_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        order_by: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> DbResult<Vec<Vec<Value>>>;
}
