//! Pending command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tm_core::ScriptInfo;

use crate::cli::{GlobalArgs, OutputFormat, PendingArgs};
use crate::commands::common::{build_migrator, build_options, column_width, load_project, ExitCode};

/// One pending script, as printed
#[derive(Debug, Serialize)]
pub(crate) struct PendingEntry {
    pub(crate) sequence_id: i64,
    pub(crate) name: String,
    pub(crate) origin: String,
}

impl From<ScriptInfo> for PendingEntry {
    fn from(script: ScriptInfo) -> Self {
        Self {
            sequence_id: script.sequence_id,
            name: script.name,
            origin: script.origin,
        }
    }
}

/// Execute the pending command
pub async fn execute(args: &PendingArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project, build_options(&project)?)?;

    let pending: Vec<PendingEntry> = migrator
        .pending()
        .await
        .context("Failed to compute pending migrations")?
        .into_iter()
        .map(PendingEntry::from)
        .collect();

    match args.output {
        OutputFormat::Table => print_table(&pending),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&pending).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
    }

    if args.check && !pending.is_empty() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

pub(crate) fn print_table(pending: &[PendingEntry]) {
    if pending.is_empty() {
        println!("No pending migrations");
        return;
    }

    let name_width = column_width("MIGRATION", pending.iter().map(|p| p.name.as_str()));
    println!("{:>12}  {:<name_width$}  ORIGIN", "ID", "MIGRATION");
    println!("{:->12}  {:-<name_width$}  {}", "", "", "-".repeat(30));
    for entry in pending {
        println!(
            "{:>12}  {:<name_width$}  {}",
            entry.sequence_id, entry.name, entry.origin
        );
    }
    println!();
    println!(
        "{} pending migration{}",
        pending.len(),
        if pending.len() == 1 { "" } else { "s" }
    );
}
