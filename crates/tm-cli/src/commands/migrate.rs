//! Migrate command implementation

use anyhow::{Context, Result};
use tm_migrate::MigrationReport;

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{build_migrator, build_options, column_width, load_project};

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let mut options = build_options(&project)?;
    if let Some(origin) = &args.origin {
        options = options.with_origin_info(origin.clone());
    }
    let migrator = build_migrator(&project, options)?;

    let report = migrator.migrate().await.context("Migration run failed")?;

    match args.output {
        OutputFormat::Table => print_report(&report),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    if report.is_noop() {
        match report.last_applied {
            Some(id) => println!("Database is up to date (last applied: {id})"),
            None => println!("No migrations found"),
        }
        return;
    }

    let name_width = column_width(
        "MIGRATION",
        report.applied.iter().map(|a| a.name.as_str()),
    );
    println!(
        "{:>12}  {:<name_width$}  {:>7}  ORIGIN",
        "ID", "MIGRATION", "BATCHES"
    );
    println!("{:->12}  {:-<name_width$}  {:->7}  {}", "", "", "", "-".repeat(30));
    for script in &report.applied {
        println!(
            "{:>12}  {:<name_width$}  {:>7}  {}",
            script.sequence_id, script.name, script.batches, script.origin
        );
    }
    println!();
    println!("{report}");
}

fn print_json(report: &MigrationReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}
