//! Prospector CLI — the main entry point.
//!
//! Commands:
//! - `research` — run one research session against a task
//! - `stats`    — show memory store statistics

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "prospector",
    about = "Prospector — autonomous web research against hard and soft criteria",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a research session
    Research {
        /// The research task, in natural language
        task: String,

        /// JSON file with {"hard": [...], "soft": [...]} criteria.
        /// Without it, criteria are parsed from the task text.
        #[arg(short, long)]
        criteria: Option<PathBuf>,

        /// Override the iteration cap
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Skip the report export
        #[arg(long)]
        no_export: bool,
    },

    /// Show memory store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Research {
            task,
            criteria,
            max_iterations,
            no_export,
        } => commands::research::run(task, criteria, max_iterations, no_export).await?,
        Commands::Stats => commands::stats::run()?,
    }

    Ok(())
}
