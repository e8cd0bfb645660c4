//! End-to-end tests of the `tm` binary against throwaway projects

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn tm_bin() -> String {
    env!("CARGO_BIN_EXE_tm").to_string()
}

/// Run `tm` in `project` and return (stdout, stderr, exit code).
fn run_tm(project: &Path, args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(tm_bin())
        .args(args)
        .args(["--project-dir", &project.display().to_string()])
        .env_remove("TIDEMARK_DATABASE")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute tm with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code(),
    )
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("tidemark.yml"),
        "database:\n  path: app.duckdb\nproviders:\n  - type: filesystem\n    path: migrations\n",
    )
    .unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir_all(&migrations).unwrap();
    fs::write(
        migrations.join("1_Init.sql"),
        "CREATE TABLE people (id BIGINT);\nGO\nINSERT INTO people VALUES (1);\n",
    )
    .unwrap();
    fs::write(
        migrations.join("2_AddPets.sql"),
        "CREATE TABLE pets (id BIGINT);",
    )
    .unwrap();
    dir
}

#[test]
fn test_migrate_then_noop() {
    let dir = project();

    let (stdout, stderr, code) = run_tm(dir.path(), &["migrate"]);
    assert_eq!(code, Some(0), "stderr: {stderr}");
    assert!(stdout.contains("2 scripts applied"), "stdout: {stdout}");
    assert!(dir.path().join("app.duckdb").exists());

    let (stdout, _, code) = run_tm(dir.path(), &["migrate"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("up to date (last applied: 2)"), "stdout: {stdout}");
}

#[test]
fn test_migrate_json_report() {
    let dir = project();

    let (stdout, stderr, code) = run_tm(dir.path(), &["migrate", "--output", "json"]);
    assert_eq!(code, Some(0), "stderr: {stderr}");

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["last_applied"], 2);
    assert_eq!(report["applied"][0]["batches"], 2);
}

#[test]
fn test_pending_check_and_status() {
    let dir = project();

    let (stdout, _, code) = run_tm(dir.path(), &["pending", "--check"]);
    assert_eq!(code, Some(1));
    assert!(stdout.contains("2 pending migrations"), "stdout: {stdout}");

    run_tm(dir.path(), &["migrate"]);

    let (stdout, _, code) = run_tm(dir.path(), &["pending", "--check"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("No pending migrations"));

    let (stdout, stderr, code) = run_tm(dir.path(), &["status", "-o", "json"]);
    assert_eq!(code, Some(0), "stderr: {stderr}");
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["history_table"], "migration_history");
    assert_eq!(status["applied"].as_array().unwrap().len(), 2);
    assert!(status["pending"].as_array().unwrap().is_empty());
}

#[test]
fn test_failed_migration_exits_nonzero() {
    let dir = project();
    fs::write(
        dir.path().join("migrations/3_Broken.sql"),
        "CREATE TABLE broken (",
    )
    .unwrap();

    let (_, stderr, code) = run_tm(dir.path(), &["migrate"]);
    assert_ne!(code, Some(0));
    assert!(stderr.contains("Migration run failed"), "stderr: {stderr}");

    // nothing from the failed run was committed
    let (stdout, _, _) = run_tm(dir.path(), &["pending"]);
    assert!(stdout.contains("3 pending migrations"), "stdout: {stdout}");
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_tm(dir.path(), &["status"]);
    assert_ne!(code, Some(0));
    assert!(stderr.contains("Failed to load project config"), "stderr: {stderr}");
}
