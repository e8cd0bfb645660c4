//! Applied-migration history backed by a table in the target database.
//!
//! Every operation runs on the caller's session, so history writes made
//! inside the run transaction commit or roll back together with the scripts.

use crate::error::{MigrateError, MigrateResult};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tm_core::ScriptInfo;
use tm_db::{
    all_records, create_table_sql, insert_record, last_record, update_record, Column, ColumnType,
    Record, Session, TableSchema, Value,
};

/// One applied (or, inside an open run, started) migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    pub sequence_id: i64,
    pub name: String,
    pub origin_info: String,
    /// `None` only between `record_start` and `record_complete` of an open run
    pub completed_at: Option<NaiveDateTime>,
}

const HISTORY_COLUMNS: &[Column] = &[
    Column::primary_key("sequence_id", ColumnType::BigInt),
    Column::required("name", ColumnType::Text),
    Column::required("origin_info", ColumnType::Text),
    Column::nullable("completed_at", ColumnType::Timestamp),
];

impl Record for MigrationRecord {
    const SCHEMA: TableSchema = TableSchema {
        columns: HISTORY_COLUMNS,
    };

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.sequence_id),
            Value::Text(self.name.clone()),
            Value::Text(self.origin_info.clone()),
            self.completed_at.into(),
        ]
    }

    fn from_row(row: Vec<Value>) -> Result<Self, String> {
        let [sequence_id, name, origin_info, completed_at]: [Value; 4] = row
            .try_into()
            .map_err(|r: Vec<Value>| format!("expected 4 columns, got {}", r.len()))?;
        Ok(Self {
            sequence_id: sequence_id
                .as_i64()
                .ok_or_else(|| format!("sequence_id is not an integer: {sequence_id}"))?,
            name: name.as_str().ok_or("name is not text")?.to_string(),
            origin_info: origin_info
                .as_str()
                .ok_or("origin_info is not text")?
                .to_string(),
            completed_at: completed_at.as_timestamp(),
        })
    }
}

/// Reads and writes [`MigrationRecord`]s in one named table
#[derive(Debug, Clone)]
pub struct HistoryStore {
    table: String,
}

impl HistoryStore {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the history table exists
    pub async fn exists(&self, session: &mut dyn Session) -> MigrateResult<bool> {
        session
            .relation_exists(&self.table)
            .await
            .map_err(|e| MigrateError::history("checking for the history table", e))
    }

    /// Create the history table if it is absent. Returns `true` if it was created.
    pub async fn ensure_table(&self, session: &mut dyn Session) -> MigrateResult<bool> {
        if self.exists(session).await? {
            return Ok(false);
        }
        let sql = create_table_sql::<MigrationRecord>(&self.table)
            .map_err(|e| MigrateError::history("building the history table DDL", e))?;
        session
            .execute(&sql)
            .await
            .map_err(|e| MigrateError::history("creating the history table", e))?;
        log::info!("Created migration history table {}", self.table);
        Ok(true)
    }

    /// The row with the greatest sequence id
    pub async fn last_applied(
        &self,
        session: &mut dyn Session,
    ) -> MigrateResult<Option<MigrationRecord>> {
        last_record(session, &self.table)
            .await
            .map_err(|e| MigrateError::history("reading the last applied migration", e))
    }

    /// Every row, ascending by sequence id
    pub async fn applied(&self, session: &mut dyn Session) -> MigrateResult<Vec<MigrationRecord>> {
        all_records(session, &self.table)
            .await
            .map_err(|e| MigrateError::history("listing applied migrations", e))
    }

    /// Insert a started, not yet completed row for `script`
    pub async fn record_start(
        &self,
        session: &mut dyn Session,
        script: &ScriptInfo,
        origin_info: &str,
    ) -> MigrateResult<MigrationRecord> {
        let record = MigrationRecord {
            sequence_id: script.sequence_id,
            name: script.name.clone(),
            origin_info: origin_info.to_string(),
            completed_at: None,
        };
        insert_record(session, &self.table, &record)
            .await
            .map_err(|e| MigrateError::history(format!("recording the start of {script}"), e))?;
        Ok(record)
    }

    /// Stamp `completed_at` with the current time and persist it
    pub async fn record_complete(
        &self,
        session: &mut dyn Session,
        record: &mut MigrationRecord,
    ) -> MigrateResult<()> {
        record.completed_at = Some(Utc::now().naive_utc());
        update_record(session, &self.table, record)
            .await
            .map_err(|e| {
                MigrateError::history(
                    format!(
                        "recording completion of {}_{}",
                        record.sequence_id, record.name
                    ),
                    e,
                )
            })
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
