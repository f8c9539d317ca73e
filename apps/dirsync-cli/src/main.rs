//! dirsync — one-shot reconciliation of a Google Workspace directory into a
//! SCIM provisioning target.
//!
//! A single invocation reads the directory's current view of the filtered
//! groups, resolves their transitive membership, diffs it against the SCIM
//! target (or the previous snapshot), applies the minimum set of mutations
//! in dependency order, and persists the new snapshot.

use clap::{Parser, Subcommand};

mod config;
mod error;
mod logging;
mod run;
mod secrets;

use error::CliResult;

/// dirsync - directory to SCIM reconciliation
#[derive(Parser)]
#[command(name = "dirsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the directory into the SCIM target once
    Sync(config::SyncArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync(args) => run::execute(args).await,
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}
