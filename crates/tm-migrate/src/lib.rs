//! tm-migrate - Versioned migration engine for Tidemark
//!
//! Discovers ordered SQL scripts from the configured providers, works out
//! which ones are newer than the last applied history row, and applies them
//! inside a single transaction together with their history rows.

pub mod error;
pub mod gate;
pub mod history;
pub mod options;
pub mod runner;

pub use error::{MigrateError, MigrateResult};
pub use gate::{trigger, RunOnceGate, TriggerOutcome};
pub use history::{HistoryStore, MigrationRecord};
pub use options::MigrationOptions;
pub use runner::{AppliedScript, MigrationReport, Migrator, RunPhase};
