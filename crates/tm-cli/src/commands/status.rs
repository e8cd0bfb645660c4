//! Status command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tm_migrate::MigrationRecord;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{build_migrator, build_options, column_width, load_project};
use crate::commands::pending::PendingEntry;

/// Status report for JSON output
#[derive(Debug, Serialize)]
struct StatusReport {
    history_table: String,
    applied: Vec<MigrationRecord>,
    pending: Vec<PendingEntry>,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project, build_options(&project)?)?;

    let applied = migrator
        .history()
        .await
        .context("Failed to read migration history")?;
    let pending: Vec<PendingEntry> = migrator
        .pending()
        .await
        .context("Failed to compute pending migrations")?
        .into_iter()
        .map(PendingEntry::from)
        .collect();

    let report = StatusReport {
        history_table: migrator.options().history_table().to_string(),
        applied,
        pending,
    };

    match args.output {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn print_table(report: &StatusReport) {
    println!("History table: {}", report.history_table);
    println!();

    if report.applied.is_empty() {
        println!("No migrations applied");
    } else {
        let name_width = column_width(
            "MIGRATION",
            report.applied.iter().map(|r| r.name.as_str()),
        );
        println!(
            "{:>12}  {:<name_width$}  {:<19}  ORIGIN",
            "ID", "MIGRATION", "COMPLETED_AT"
        );
        println!(
            "{:->12}  {:-<name_width$}  {:-<19}  {}",
            "",
            "",
            "",
            "-".repeat(30)
        );
        for record in &report.applied {
            let completed = record
                .completed_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:>12}  {:<name_width$}  {:<19}  {}",
                record.sequence_id, record.name, completed, record.origin_info
            );
        }
    }

    println!();
    println!(
        "{} applied, {} pending",
        report.applied.len(),
        report.pending.len()
    );
}
