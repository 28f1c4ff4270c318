//! autosubmit - atomic cross-repository submission for Gerrit
//!
//! CLI binary driving the event dispatcher from a `stream-events` feed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "autosubmit")]
#[command(about = "Submit cross-repository Gerrit change groups all-or-nothing")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read stream-events JSON lines from stdin and act on them
    Run,

    /// Print the readiness verdict for one change
    Check {
        /// Project the change belongs to
        project: String,

        /// Change number
        number: u64,
    },

    /// Print the effective configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "autosubmit=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run => cli::run_events(config).await?,
        Commands::Check { project, number } => cli::run_check(config, &project, number).await?,
        Commands::Config => cli::run_show_config(config)?,
    }

    Ok(())
}
