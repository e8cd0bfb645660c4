//! Run-once gate for the HTTP trigger.
//!
//! An in-process, time-windowed marker that lets bursts of trigger requests
//! around deploy time fall through without re-entering the runner. It does
//! not coordinate separate processes; those rely on the history table's
//! primary key to fail a conflicting run.

use crate::error::MigrateResult;
use crate::runner::{MigrationReport, Migrator};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Default marker lifetime
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(120);

/// Time-windowed "already attempted" marker with sliding expiration
#[derive(Debug)]
pub struct RunOnceGate {
    window: Duration,
    expires_at: Mutex<Option<Instant>>,
}

impl Default for RunOnceGate {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl RunOnceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            expires_at: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True only if no marker is currently active
    pub fn should_run(&self) -> bool {
        let expires_at = self.expires_at.lock().unwrap_or_else(PoisonError::into_inner);
        is_open(*expires_at)
    }

    /// Set (or push back) the marker to expire one window from now
    pub fn mark_attempted(&self) {
        let mut expires_at = self.expires_at.lock().unwrap_or_else(PoisonError::into_inner);
        *expires_at = Some(Instant::now() + self.window);
    }

    /// Atomic [`should_run`](Self::should_run) + [`mark_attempted`](Self::mark_attempted).
    ///
    /// Returns true for exactly one caller per window. A marker that is
    /// still active is refreshed, so a steady stream of requests keeps the
    /// gate closed.
    pub fn try_acquire(&self) -> bool {
        let mut expires_at = self.expires_at.lock().unwrap_or_else(PoisonError::into_inner);
        let open = is_open(*expires_at);
        *expires_at = Some(Instant::now() + self.window);
        open
    }

    /// Drop the marker so the next request runs
    pub fn reset(&self) {
        let mut expires_at = self.expires_at.lock().unwrap_or_else(PoisonError::into_inner);
        *expires_at = None;
    }
}

fn is_open(expires_at: Option<Instant>) -> bool {
    match expires_at {
        None => true,
        Some(at) => Instant::now() >= at,
    }
}

/// What a trigger request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The gate was closed; the runner was not entered
    Skipped,
    /// The runner completed
    Ran(MigrationReport),
}

/// Run the migrator unless the gate has seen an attempt inside its window.
///
/// The marker is set before the run, so a failed run also closes the gate
/// until the window passes; the error is still returned to the caller.
pub async fn trigger(migrator: &Migrator, gate: &RunOnceGate) -> MigrateResult<TriggerOutcome> {
    if !gate.try_acquire() {
        log::debug!("Migration trigger skipped: attempted within the last {:?}", gate.window());
        return Ok(TriggerOutcome::Skipped);
    }
    migrator.migrate().await.map(TriggerOutcome::Ran)
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
