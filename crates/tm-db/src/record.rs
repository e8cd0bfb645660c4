//! Static record mapping.
//!
//! A [`Record`] describes its table shape with a [`TableSchema`] and converts
//! itself to and from a positional row of [`Value`]s. The generic helpers in
//! this module build the SQL for any record type; the table name is supplied
//! at runtime because callers may configure it.

use crate::error::{DbError, DbResult};
use crate::traits::Session;
use chrono::NaiveDateTime;
use std::fmt;

/// Logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit signed integer
    BigInt,
    /// Variable-length text
    Text,
    /// Timestamp without time zone
    Timestamp,
}

impl ColumnType {
    fn sql(self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Text => "VARCHAR",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// One column of a [`TableSchema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Column {
    /// A non-null column
    pub const fn required(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            primary_key: false,
        }
    }

    /// A nullable column
    pub const fn nullable(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: true,
            primary_key: false,
        }
    }

    /// The primary key column
    pub const fn primary_key(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            primary_key: true,
        }
    }
}

/// Column list of a record type. The first primary key column is the key
/// used by [`update_record`].
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub columns: &'static [Column],
}

impl TableSchema {
    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Index and definition of the primary key column
    pub fn primary_key(&self) -> Option<(usize, &'static Column)> {
        self.columns.iter().enumerate().find(|(_, c)| c.primary_key)
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    BigInt(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Read as a required integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Read as text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Read as a nullable timestamp; `None` for both NULL and non-timestamps
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.6f")),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Option<NaiveDateTime>> for Value {
    fn from(v: Option<NaiveDateTime>) -> Self {
        v.map_or(Value::Null, Value::Timestamp)
    }
}

/// A row type with a static table shape
pub trait Record: Sized {
    /// Column description shared by every table holding this record
    const SCHEMA: TableSchema;

    /// Values in `SCHEMA` column order
    fn to_row(&self) -> Vec<Value>;

    /// Build from values in `SCHEMA` column order
    fn from_row(row: Vec<Value>) -> Result<Self, String>;
}

/// Reject anything but `ident` or `schema.ident` made of ASCII word characters.
pub fn validate_identifier(name: &str) -> DbResult<()> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_part(p)) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

/// `CREATE TABLE IF NOT EXISTS` statement for a record type
pub fn create_table_sql<R: Record>(table: &str) -> DbResult<String> {
    validate_identifier(table)?;
    let columns: Vec<String> = R::SCHEMA
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", c.name, c.column_type.sql());
            if c.primary_key {
                def.push_str(" PRIMARY KEY");
            } else if !c.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table,
        columns.join(", ")
    ))
}

/// Insert a record as a new row
pub async fn insert_record<R: Record>(
    session: &mut dyn Session,
    table: &str,
    record: &R,
) -> DbResult<()> {
    validate_identifier(table)?;
    let columns = R::SCHEMA.column_names();
    session.insert_row(table, &columns, record.to_row()).await
}

/// Overwrite every non-key column of the row matching the record's primary key
pub async fn update_record<R: Record>(
    session: &mut dyn Session,
    table: &str,
    record: &R,
) -> DbResult<()> {
    validate_identifier(table)?;
    let (key_idx, key_col) = R::SCHEMA.primary_key().ok_or_else(|| DbError::DecodeError {
        table: table.to_string(),
        message: "record schema has no primary key".to_string(),
    })?;

    let mut values = record.to_row();
    let key = values.remove(key_idx);
    let columns: Vec<&str> = R::SCHEMA
        .columns
        .iter()
        .filter(|c| !c.primary_key)
        .map(|c| c.name)
        .collect();

    let affected = session
        .update_row(table, key_col.name, key.clone(), &columns, values)
        .await?;
    if affected == 0 {
        return Err(DbError::ExecutionError(format!(
            "no row in {table} with {} = {key}",
            key_col.name
        )));
    }
    Ok(())
}

/// The record with the greatest primary key, if any
pub async fn last_record<R: Record>(session: &mut dyn Session, table: &str) -> DbResult<Option<R>> {
    let mut rows = select_records::<R>(session, table, true, Some(1)).await?;
    Ok(rows.pop())
}

/// All records ordered by primary key ascending
pub async fn all_records<R: Record>(session: &mut dyn Session, table: &str) -> DbResult<Vec<R>> {
    select_records::<R>(session, table, false, None).await
}

async fn select_records<R: Record>(
    session: &mut dyn Session,
    table: &str,
    descending: bool,
    limit: Option<usize>,
) -> DbResult<Vec<R>> {
    validate_identifier(table)?;
    let (_, key_col) = R::SCHEMA.primary_key().ok_or_else(|| DbError::DecodeError {
        table: table.to_string(),
        message: "record schema has no primary key".to_string(),
    })?;
    let columns = R::SCHEMA.column_names();
    let rows = session
        .select_rows(table, &columns, key_col.name, descending, limit)
        .await?;
    rows.into_iter()
        .map(|row| {
            R::from_row(row).map_err(|message| DbError::DecodeError {
                table: table.to_string(),
                message,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
