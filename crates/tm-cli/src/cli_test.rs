use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from([
        "tm",
        "status",
        "--project-dir",
        "/srv/app",
        "--database",
        "/tmp/app.duckdb",
        "-v",
    ])
    .unwrap();

    assert!(cli.global.verbose);
    assert_eq!(cli.global.project_dir, "/srv/app");
    assert_eq!(cli.global.database.as_deref(), Some("/tmp/app.duckdb"));
    assert!(matches!(cli.command, Commands::Status(_)));
}

#[test]
fn test_pending_check_flag() {
    let cli = Cli::try_parse_from(["tm", "pending", "--check", "-o", "json"]).unwrap();
    match cli.command {
        Commands::Pending(args) => {
            assert!(args.check);
            assert_eq!(args.output, OutputFormat::Json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_migrate_defaults() {
    let cli = Cli::try_parse_from(["tm", "migrate"]).unwrap();
    assert_eq!(cli.global.project_dir, ".");
    match cli.command {
        Commands::Migrate(args) => {
            assert_eq!(args.output, OutputFormat::Table);
            assert!(args.origin.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[cfg(feature = "serve")]
#[test]
fn test_serve_overrides() {
    let cli = Cli::try_parse_from(["tm", "serve", "--port", "9000", "--window-secs", "30"]).unwrap();
    match cli.command {
        Commands::Serve(args) => {
            assert_eq!(args.port, Some(9000));
            assert_eq!(args.window_secs, Some(30));
            assert!(args.host.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
