//! Migration runner.
//!
//! A run discovers scripts from every provider, computes the pending set
//! relative to the last applied history row, and executes the pending
//! scripts in ascending sequence id order inside one transaction. Any
//! failure rolls the whole run back, so a run is all-or-nothing.

use crate::error::{MigrateError, MigrateResult};
use crate::history::{HistoryStore, MigrationRecord};
use crate::options::MigrationOptions;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tm_core::{CoreError, ScriptInfo, ScriptProvider};
use tm_db::{Database, Session};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    EnsuringHistoryTable,
    ComputingPending,
    NoPending,
    Executing { index: usize, total: usize },
    Committing,
    RolledBack,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => f.write_str("idle"),
            RunPhase::EnsuringHistoryTable => f.write_str("ensuring history table"),
            RunPhase::ComputingPending => f.write_str("computing pending scripts"),
            RunPhase::NoPending => f.write_str("no pending scripts"),
            RunPhase::Executing { index, total } => write!(f, "executing {index}/{total}"),
            RunPhase::Committing => f.write_str("committing"),
            RunPhase::RolledBack => f.write_str("rolled back"),
        }
    }
}

/// A script applied by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedScript {
    pub sequence_id: i64,
    pub name: String,
    pub origin: String,
    pub batches: usize,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Scripts applied by this run, in execution order
    pub applied: Vec<AppliedScript>,
    /// Greatest applied sequence id after the run
    pub last_applied: Option<i64>,
}

impl MigrationReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.applied_count();
        write!(f, "{} script{} applied", n, if n == 1 { "" } else { "s" })
    }
}

/// A discovered script paired with the provider that loads it
struct Discovered {
    provider: Arc<dyn ScriptProvider>,
    info: ScriptInfo,
}

/// Applies pending migrations from [`MigrationOptions`] to a [`Database`]
pub struct Migrator {
    db: Arc<dyn Database>,
    options: MigrationOptions,
    history: HistoryStore,
}

impl Migrator {
    /// Create a migrator; invalid options fail here, before any database access.
    pub fn new(db: Arc<dyn Database>, options: MigrationOptions) -> MigrateResult<Self> {
        options.validate()?;
        let history = HistoryStore::new(options.history_table());
        Ok(Self {
            db,
            options,
            history,
        })
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Apply every script newer than the last applied history row.
    pub async fn migrate(&self) -> MigrateResult<MigrationReport> {
        let scripts = self.discover()?;

        let mut session = self.open_session().await?;
        let session = session.as_mut();

        self.enter(RunPhase::EnsuringHistoryTable);
        self.history.ensure_table(session).await?;

        self.enter(RunPhase::ComputingPending);
        let last_applied = self.history.last_applied(session).await?;
        let pending = pending_after(scripts, last_applied.as_ref());

        if pending.is_empty() {
            self.enter(RunPhase::NoPending);
            log::info!(
                "Database is up to date (last applied: {})",
                describe_last(last_applied.as_ref())
            );
            self.enter(RunPhase::Idle);
            return Ok(MigrationReport {
                applied: Vec::new(),
                last_applied: last_applied.map(|r| r.sequence_id),
            });
        }

        log::info!(
            "Applying {} pending migration(s) after {}",
            pending.len(),
            describe_last(last_applied.as_ref())
        );

        session
            .begin()
            .await
            .map_err(|source| MigrateError::Transaction {
                stage: "begin",
                source,
            })?;

        let applied = match self.apply_all(session, &pending).await {
            Ok(applied) => applied,
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    log::warn!("Rollback after failed migration also failed: {rollback_err}");
                }
                self.enter(RunPhase::RolledBack);
                log::warn!("Migration run rolled back: {err}");
                self.enter(RunPhase::Idle);
                return Err(err);
            }
        };

        self.enter(RunPhase::Committing);
        session
            .commit()
            .await
            .map_err(|source| MigrateError::Transaction {
                stage: "commit",
                source,
            })?;

        let report = MigrationReport {
            last_applied: applied.last().map(|a| a.sequence_id),
            applied,
        };
        log::info!("Migration run complete: {report}");
        self.enter(RunPhase::Idle);
        Ok(report)
    }

    /// [`migrate`](Self::migrate) for synchronous callers.
    ///
    /// Drives the run on a private current-thread runtime, so it must not be
    /// called from inside an async context.
    pub fn migrate_blocking(&self) -> MigrateResult<MigrationReport> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(MigrateError::Runtime)?
            .block_on(self.migrate())
    }

    /// Scripts the next run would apply. Reads history but writes nothing,
    /// not even the history table.
    pub async fn pending(&self) -> MigrateResult<Vec<ScriptInfo>> {
        let scripts = self.discover()?;
        let mut session = self.open_session().await?;
        let session = session.as_mut();

        let last_applied = if self.history.exists(session).await? {
            self.history.last_applied(session).await?
        } else {
            None
        };
        Ok(pending_after(scripts, last_applied.as_ref())
            .into_iter()
            .map(|d| d.info)
            .collect())
    }

    /// Applied migrations in ascending order; empty if the history table is absent.
    pub async fn history(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let mut session = self.open_session().await?;
        let session = session.as_mut();
        if !self.history.exists(session).await? {
            return Ok(Vec::new());
        }
        self.history.applied(session).await
    }

    async fn open_session(&self) -> MigrateResult<Box<dyn Session>> {
        self.db
            .connect()
            .await
            .map_err(|e| MigrateError::history(format!("connecting to {}", self.db.db_type()), e))
    }

    /// List every provider and merge into one ascending sequence.
    ///
    /// The sort is stable: equal ids stay in provider registration order,
    /// then listing order. Equal ids must be the same script exposed twice
    /// (same name and text), in which case the first registration wins.
    fn discover(&self) -> MigrateResult<Vec<Discovered>> {
        let mut scripts = Vec::new();
        for provider in self.options.providers() {
            let listed = provider.list().map_err(MigrateError::Configuration)?;
            log::debug!("{} listed {} script(s)", provider.describe(), listed.len());
            scripts.extend(listed.into_iter().map(|info| Discovered {
                provider: Arc::clone(provider),
                info,
            }));
        }
        scripts.sort_by_key(|d| d.info.sequence_id);

        let mut merged: Vec<Discovered> = Vec::with_capacity(scripts.len());
        for script in scripts {
            match merged.last() {
                Some(kept) if kept.info.sequence_id == script.info.sequence_id => {
                    if !same_script(kept, &script)? {
                        return Err(CoreError::DuplicateSequenceId {
                            sequence_id: script.info.sequence_id,
                            first: format!("{} ({})", kept.info.locator, kept.info.origin),
                            second: format!("{} ({})", script.info.locator, script.info.origin),
                        }
                        .into());
                    }
                    log::warn!(
                        "Script {} is exposed by both {} and {}; using the first",
                        script.info,
                        kept.info.origin,
                        script.info.origin
                    );
                }
                _ => merged.push(script),
            }
        }
        Ok(merged)
    }

    async fn apply_all(
        &self,
        session: &mut dyn Session,
        pending: &[Discovered],
    ) -> MigrateResult<Vec<AppliedScript>> {
        let total = pending.len();
        let mut applied = Vec::with_capacity(total);
        for (i, script) in pending.iter().enumerate() {
            self.enter(RunPhase::Executing {
                index: i + 1,
                total,
            });
            applied.push(self.apply_one(session, script).await?);
        }
        Ok(applied)
    }

    async fn apply_one(
        &self,
        session: &mut dyn Session,
        script: &Discovered,
    ) -> MigrateResult<AppliedScript> {
        let info = &script.info;
        let mut record = self
            .history
            .record_start(session, info, self.options.origin_info())
            .await?;

        let text = load_script(script)?;
        let batches = self.options.splitter().split(&text);

        for (i, batch) in batches.iter().enumerate() {
            log::debug!("{info}: batch {}/{}", i + 1, batches.len());
            session
                .execute_batch(batch)
                .await
                .map_err(|source| MigrateError::Execution {
                    sequence_id: info.sequence_id,
                    name: info.name.clone(),
                    batch: i + 1,
                    source,
                })?;
        }

        self.history.record_complete(session, &mut record).await?;
        log::info!("Applied migration {info} from {}", info.origin);

        Ok(AppliedScript {
            sequence_id: info.sequence_id,
            name: info.name.clone(),
            origin: info.origin.clone(),
            batches: batches.len(),
        })
    }

    fn enter(&self, phase: RunPhase) {
        log::debug!("Migration run: {phase}");
    }
}

fn pending_after(scripts: Vec<Discovered>, last: Option<&MigrationRecord>) -> Vec<Discovered> {
    let last_id = last.map_or(0, |r| r.sequence_id);
    scripts
        .into_iter()
        .filter(|d| d.info.sequence_id > last_id)
        .collect()
}

fn same_script(a: &Discovered, b: &Discovered) -> MigrateResult<bool> {
    if a.info.name != b.info.name {
        return Ok(false);
    }
    Ok(load_script(a)? == load_script(b)?)
}

/// Every load failure, I/O included, is reported against the script.
fn load_script(script: &Discovered) -> MigrateResult<String> {
    script
        .provider
        .load(&script.info)
        .map_err(|source| MigrateError::ScriptNotFound {
            script: script.info.locator.clone(),
            source,
        })
}

fn describe_last(last: Option<&MigrationRecord>) -> String {
    last.map_or_else(
        || "none".to_string(),
        |r| format!("{}_{}", r.sequence_id, r.name),
    )
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
