//! Relay: release-tracking build and delivery pipeline.
//!
//! # Usage
//!
//! ```text
//! relay [--root <dir>] [--verbose] init [--example]
//! relay tasks
//! relay check <task>
//! relay run [--force] [--task <name>]...
//! relay status [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, init::InitArgs, run::RunArgs, status::StatusArgs, tasks::TasksArgs};
use relay_core::Layout;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Track upstream releases, rebuild and deliver portable packages",
    long_about = None,
)]
struct Cli {
    /// Relay root directory. Defaults to ~/.relay
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the relay root layout and a default relay.yaml.
    Init(InitArgs),

    /// List task definitions and whether they validate.
    Tasks(TasksArgs),

    /// Compare one task's delivered version against its page, without building.
    Check(CheckArgs),

    /// Process every task (or the selected ones) through the pipeline.
    Run(RunArgs),

    /// Show delivered versions and retained archives.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let layout = match cli.root {
        Some(root) => Layout::new(root),
        None => Layout::new(Layout::default_root()?),
    };

    match cli.command {
        Commands::Init(args) => args.run(&layout),
        Commands::Tasks(args) => args.run(&layout),
        Commands::Check(args) => args.run(&layout),
        Commands::Run(args) => args.run(&layout),
        Commands::Status(args) => args.run(&layout),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
