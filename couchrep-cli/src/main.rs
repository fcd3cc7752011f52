//! couchrep — manage replication directives between document-store hosts.
//!
//! # Usage
//!
//! ```text
//! couchrep replicate <local> <remote> [--push] [--continuous] [--create-target] [--dry-run]
//! couchrep replicators list <host> [--json]
//! couchrep replicators show <host> <id> [--rev <rev>]
//! couchrep replicators delete <host> (<id> | --all)
//! couchrep host add <name> <url>
//! couchrep host list
//! ```
//!
//! Hosts are aliases from `~/.couchrep/config.yaml` or literal http(s) URLs.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{host::HostCommand, replicate::ReplicateArgs, replicators::ReplicatorsCommand};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "couchrep",
    version,
    about = "Manage replication directives between document-store hosts",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update one replication directive per database.
    Replicate(ReplicateArgs),

    /// Inspect or delete the directives registered on a host.
    Replicators {
        #[command(subcommand)]
        command: ReplicatorsCommand,
    },

    /// Manage host aliases in the settings file.
    Host {
        #[command(subcommand)]
        command: HostCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Replicate(args) => args.run(),
        Commands::Replicators { command } => commands::replicators::run(command),
        Commands::Host { command } => commands::host::run(command),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
