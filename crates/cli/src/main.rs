//! repokeep CLI — the main entry point.
//!
//! Commands:
//! - `deps` — Plan dependency upgrades for a Python repository
//! - `lint` — Lint and format a Python repository with ruff

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "repokeep",
    about = "repokeep — agent-driven repository maintenance",
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
    /// Plan dependency upgrades for a Python repository
    Deps(commands::deps::DepsArgs),

    /// Lint and format a Python repository with ruff
    Lint(commands::lint::LintArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Deps(args) => commands::deps::run(args).await?,
        Commands::Lint(args) => commands::lint::run(args).await?,
    }

    Ok(())
}
