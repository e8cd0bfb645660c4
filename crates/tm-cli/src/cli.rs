//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tidemark - apply versioned SQL migrations to a database
#[derive(Parser, Debug)]
#[command(name = "tm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path from the config (used as given)
    #[arg(short, long, global = true, env = "TIDEMARK_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply every pending migration in one transaction
    Migrate(MigrateArgs),

    /// Show applied migrations and how many are pending
    Status(StatusArgs),

    /// List migrations the next run would apply
    Pending(PendingArgs),

    /// Serve the HTTP migration trigger
    #[cfg(feature = "serve")]
    Serve(ServeArgs),
}

/// Output formats shared by the reporting commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Output format for the run report
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Override the origin recorded in history rows
    #[arg(long)]
    pub origin: Option<String>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the pending command
#[derive(Args, Debug)]
pub struct PendingArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Exit with code 1 when migrations are pending
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the serve command
#[cfg(feature = "serve")]
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind (defaults to server.host from the config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (defaults to server.port from the config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Run-once window in seconds (defaults to gate.window_secs)
    #[arg(long)]
    pub window_secs: Option<u64>,

    /// Apply pending migrations once before accepting requests
    #[arg(long)]
    pub migrate_on_start: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
