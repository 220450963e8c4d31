//! `repokeep lint` — run the linting agent.

use clap::Args;
use repokeep_agent::lint::{LintAgent, LintSettings, DEFAULT_BRANCH};
use repokeep_config::AppConfig;
use repokeep_core::error::Result;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Args)]
pub struct LintArgs {
    /// Path to the repository to lint
    #[arg(long)]
    pub repo_path: PathBuf,

    /// Branch a follow-up pull request would use
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch_name: String,

    /// Apply changes instead of planning only
    #[arg(long)]
    pub no_dry_run: bool,

    /// Leave unsafe-to-fix issues alone instead of auto-fixing safe ones
    #[arg(long)]
    pub no_auto_fix: bool,

    /// Skip code formatting
    #[arg(long)]
    pub no_format: bool,

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

fn render_rules(rules: &Value) -> Option<String> {
    match rules {
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

pub async fn run(args: LintArgs) -> Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;

    let provider = repokeep_providers::from_config(&config)?;
    let model = args.model.unwrap_or_else(|| config.default_model.clone());

    let mut settings = LintSettings::new(&args.repo_path);
    settings.branch_name = args.branch_name;
    settings.max_steps = args.max_steps.unwrap_or(config.max_steps);
    settings.verbose = !args.quiet;
    settings.dry_run = !args.no_dry_run;
    settings.auto_fix = !args.no_auto_fix;
    settings.format_code = !args.no_format;

    let agent = LintAgent::new(provider, model).with_max_tokens(config.max_tokens);
    let outcome = agent.run(&settings).await?;

    println!();
    println!("Completed linting workflow");
    println!("Files analyzed: {}", outcome.files_analyzed);
    println!("Issues fixed: {}", outcome.issues_fixed);
    println!("Issues remaining: {}", outcome.issues_remaining);
    println!(
        "Code formatted: {}",
        if outcome.formatted { "Yes" } else { "No" }
    );

    if let Some(suggestions) = outcome.config_suggestions.as_object() {
        if !suggestions.is_empty() {
            println!();
            println!("Configuration Suggestions:");
            for (category, rules) in suggestions {
                if let Some(rendered) = render_rules(rules) {
                    println!("  {category}: {rendered}");
                }
            }
        }
    }

    println!();
    println!("Full report saved at: {}", outcome.report_path.display());

    Ok(())
}
