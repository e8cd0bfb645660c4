//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::record::{validate_identifier, Value};
use crate::traits::{Database, Session};
use async_trait::async_trait;
use chrono::DateTime;
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
///
/// Holds a root connection; every [`Session`] gets its own clone of it so
/// transactions opened by different sessions are isolated from each other.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        execute_on(&conn, sql)
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Query count synchronously
    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn connect(&self) -> DbResult<Box<dyn Session>> {
        let conn = self
            .lock()?
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Box::new(DuckDbSession {
            conn,
            in_transaction: false,
        }))
    }

    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        relation_exists_on(&conn, name)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// A dedicated DuckDB connection with explicit transaction control
pub struct DuckDbSession {
    conn: Connection,
    in_transaction: bool,
}

#[async_trait]
impl Session for DuckDbSession {
    async fn execute(&mut self, sql: &str) -> DbResult<usize> {
        execute_on(&self.conn, sql)
    }

    async fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql).map_err(DbError::from)
    }

    async fn relation_exists(&mut self, name: &str) -> DbResult<bool> {
        relation_exists_on(&self.conn, name)
    }

    async fn begin(&mut self) -> DbResult<()> {
        if self.in_transaction {
            return Err(DbError::TransactionError(
                "a transaction is already open on this session".to_string(),
            ));
        }
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        if !self.in_transaction {
            return Err(DbError::TransactionError(
                "COMMIT without an open transaction".to_string(),
            ));
        }
        self.in_transaction = false;
        if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
            let _ = self.conn.execute_batch("ROLLBACK");
            return Err(DbError::from(commit_err));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        if !self.in_transaction {
            return Err(DbError::TransactionError(
                "ROLLBACK without an open transaction".to_string(),
            ));
        }
        self.in_transaction = false;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    async fn insert_row(
        &mut self,
        table: &str,
        columns: &[&str],
        values: Vec<Value>,
    ) -> DbResult<()> {
        validate_identifier(table)?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        );
        let params: Vec<DuckValue> = values.into_iter().map(to_duck_value).collect();
        self.conn
            .execute(&sql, duckdb::params_from_iter(params))
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn update_row(
        &mut self,
        table: &str,
        key_column: &str,
        key: Value,
        columns: &[&str],
        values: Vec<Value>,
    ) -> DbResult<usize> {
        validate_identifier(table)?;
        let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            table,
            assignments.join(", "),
            key_column
        );
        let mut params: Vec<DuckValue> = values.into_iter().map(to_duck_value).collect();
        params.push(to_duck_value(key));
        self.conn
            .execute(&sql, duckdb::params_from_iter(params))
            .map_err(DbError::from)
    }

    async fn select_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        order_by: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> DbResult<Vec<Vec<Value>>> {
        validate_identifier(table)?;
        let mut sql = format!(
            "SELECT {} FROM {} ORDER BY {} {}",
            columns.join(", "),
            table,
            order_by,
            if descending { "DESC" } else { "ASC" }
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let width = columns.len();
        let mut stmt = self.conn.prepare(&sql)?;
        let raw_rows: Vec<Vec<DuckValue>> = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, DuckValue>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| from_duck_value(table, v))
                    .collect::<DbResult<Vec<_>>>()
            })
            .collect()
    }
}

impl Drop for DuckDbSession {
    fn drop(&mut self) {
        if self.in_transaction {
            log::warn!("Session dropped with an open transaction; rolling back");
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

fn execute_on(conn: &Connection, sql: &str) -> DbResult<usize> {
    conn.execute(sql, []).map_err(DbError::from)
}

fn relation_exists_on(conn: &Connection, name: &str) -> DbResult<bool> {
    // Handle schema-qualified names
    let (schema, table) = if let Some(pos) = name.rfind('.') {
        (&name[..pos], &name[pos + 1..])
    } else {
        ("main", name)
    };

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            duckdb::params![schema, table],
            |row| row.get(0),
        )
        .map_err(|e| DbError::ExecutionError(e.to_string()))?;

    Ok(count > 0)
}

fn to_duck_value(value: Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::BigInt(v) => DuckValue::BigInt(v),
        Value::Text(s) => DuckValue::Text(s),
        Value::Timestamp(ts) => {
            DuckValue::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
        }
    }
}

fn from_duck_value(table: &str, value: DuckValue) -> DbResult<Value> {
    let decode_err = |message: String| DbError::DecodeError {
        table: table.to_string(),
        message,
    };
    match value {
        DuckValue::Null => Ok(Value::Null),
        DuckValue::TinyInt(v) => Ok(Value::BigInt(v.into())),
        DuckValue::SmallInt(v) => Ok(Value::BigInt(v.into())),
        DuckValue::Int(v) => Ok(Value::BigInt(v.into())),
        DuckValue::BigInt(v) => Ok(Value::BigInt(v)),
        DuckValue::UTinyInt(v) => Ok(Value::BigInt(v.into())),
        DuckValue::USmallInt(v) => Ok(Value::BigInt(v.into())),
        DuckValue::UInt(v) => Ok(Value::BigInt(v.into())),
        DuckValue::Text(s) => Ok(Value::Text(s)),
        DuckValue::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|dt| Value::Timestamp(dt.naive_utc()))
                .ok_or_else(|| decode_err(format!("timestamp out of range: {raw}")))
        }
        other => Err(decode_err(format!("unsupported column value: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
