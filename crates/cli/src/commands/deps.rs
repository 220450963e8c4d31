//! `repokeep deps` — run the dependency-upgrade planning agent.

use clap::Args;
use repokeep_agent::deps::{DepsAgent, DepsSettings, DEFAULT_BRANCH};
use repokeep_config::AppConfig;
use repokeep_core::error::Result;
use std::path::PathBuf;

#[derive(Args)]
pub struct DepsArgs {
    /// Path to the repository checkout to analyze
    #[arg(long)]
    pub repo_path: PathBuf,

    /// Original repository URL, recorded as plan provenance
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Branch a follow-up pull request would use
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch_name: String,

    /// Apply changes instead of planning only
    #[arg(long)]
    pub no_dry_run: bool,

    /// Chat model override (defaults to the configured model)
    #[arg(long)]
    pub model: Option<String>,

    /// Model invocation budget override
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Suppress the progress stream
    #[arg(long)]
    pub quiet: bool,
}

pub async fn run(args: DepsArgs) -> Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;

    let provider = repokeep_providers::from_config(&config)?;
    let model = args.model.unwrap_or_else(|| config.default_model.clone());

    let repo_url = args
        .repo_url
        .unwrap_or_else(|| args.repo_path.display().to_string());
    let mut settings = DepsSettings::new(&args.repo_path, repo_url);
    settings.branch_name = args.branch_name;
    settings.max_steps = args.max_steps.unwrap_or(config.max_steps);
    settings.verbose = !args.quiet;
    settings.dry_run = !args.no_dry_run;

    let agent = DepsAgent::new(provider, model).with_max_tokens(config.max_tokens);
    let outcome = agent.run(&settings).await?;

    println!("Completed dependency update workflow");
    for change in &outcome.applied_changes {
        println!("- {change}");
    }
    println!("Report stored at {}", outcome.report_path.display());

    Ok(())
}
