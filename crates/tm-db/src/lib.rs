//! tm-db - Database collaborator for Tidemark
//!
//! This crate provides the `Database` and `Session` traits the migration
//! engine runs against, a static record mapping layer, and a DuckDB
//! implementation.

pub mod duckdb;
pub mod error;
pub mod record;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use record::{
    all_records, create_table_sql, insert_record, last_record, update_record, Column, ColumnType,
    Record, TableSchema, Value,
};
pub use traits::{Database, Session};
