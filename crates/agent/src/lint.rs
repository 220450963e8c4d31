//! The code-linting agent.
//!
//! Walks the model through a scan / analyze / fix / format workflow over
//! the ruff tools and writes the resulting report to `lint_report.json`
//! at the repository root.

use crate::loop_runner::AgentLoop;
use crate::normalize::OutputNormalizer;
use repokeep_core::error::Result;
use repokeep_core::message::Conversation;
use repokeep_core::provider::Provider;
use repokeep_core::report::Report;
use repokeep_core::trace::Trace;
use repokeep_tools::linting_registry;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_BRANCH: &str = "repokeep/lint-fixes";
pub const DEFAULT_MAX_STEPS: u32 = 25;

/// Per-run settings for the lint agent.
#[derive(Debug, Clone)]
pub struct LintSettings {
    /// Local checkout to lint
    pub repo_path: PathBuf,

    /// Branch name a follow-up PR would use
    pub branch_name: String,

    /// Model invocation budget
    pub max_steps: u32,

    /// Emit progress lines to stdout
    pub verbose: bool,

    /// Plan only; never touch the working tree
    pub dry_run: bool,

    /// Ask the model to auto-fix safe issues
    pub auto_fix: bool,

    /// Ask the model to run the formatter
    pub format_code: bool,
}

impl LintSettings {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            branch_name: DEFAULT_BRANCH.into(),
            max_steps: DEFAULT_MAX_STEPS,
            verbose: false,
            dry_run: true,
            auto_fix: true,
            format_code: true,
        }
    }
}

/// High-level summary of a linting run.
#[derive(Debug)]
pub struct LintOutcome {
    pub files_analyzed: u64,
    pub issues_fixed: u64,
    pub issues_remaining: u64,
    pub formatted: bool,
    pub report_path: PathBuf,
    pub config_suggestions: Value,
    pub report: Report,
}

pub struct LintAgent {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: Option<u32>,
    trace: Option<Trace>,
}

impl LintAgent {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: None,
            trace: None,
        }
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Route progress lines to a specific sink instead of stdout.
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = Some(trace);
        self
    }

    fn system_prompt() -> String {
        "You are a Python code quality agent that uses Ruff to lint and format code. \
         Your workflow:\n\
         1. Scan the repository to understand its structure\n\
         2. Analyze the codebase patterns to suggest appropriate linting rules\n\
         3. Check for linting issues (use auto_fix=true to fix safe issues automatically)\n\
         4. Format the code using ruff format\n\
         5. Generate a final report with:\n\
            - Summary of files analyzed\n\
            - Issues fixed automatically\n\
            - Issues remaining that need manual intervention\n\
            - Suggested configuration improvements\n\n\
         Return your final response as JSON with these keys:\n\
         - files_analyzed (int)\n\
         - issues_fixed (int)\n\
         - issues_remaining (int)\n\
         - formatted (bool)\n\
         - config_suggestions (dict with 'essential', 'recommended', 'optional' rule categories)\n\
         - summary (string with human-readable summary)\n"
            .into()
    }

    fn user_prompt(settings: &LintSettings) -> String {
        let mut prompt = format!(
            "Analyze and lint the Python repository at {}. ",
            settings.repo_path.display()
        );
        if settings.auto_fix {
            prompt.push_str("Auto-fix safe linting issues. ");
        }
        if settings.format_code {
            prompt.push_str("Format the code. ");
        }
        prompt.push_str("Provide config suggestions based on codebase patterns.");
        prompt
    }

    /// Lint the repository and write the report.
    pub async fn run(&self, settings: &LintSettings) -> Result<LintOutcome> {
        let trace = self
            .trace
            .clone()
            .unwrap_or_else(|| Trace::from_flag(settings.verbose));
        trace.emit("agent", "Starting linting analysis run.");
        info!(repo = %settings.repo_path.display(), "Linting analysis run");

        let mut conversation =
            Conversation::seeded(Self::system_prompt(), Self::user_prompt(settings));

        let registry = linting_registry(&settings.repo_path);
        let mut agent_loop = AgentLoop::new(
            self.provider.clone(),
            &self.model,
            0.0,
            Arc::new(registry),
        )
        .with_max_steps(settings.max_steps)
        .with_trace(trace.clone());
        if let Some(max) = self.max_tokens {
            agent_loop = agent_loop.with_max_tokens(max);
        }

        let raw_output = agent_loop.run(&mut conversation).await?;

        let mut skeleton = Map::new();
        skeleton.insert("files_analyzed".into(), json!(0));
        skeleton.insert("issues_fixed".into(), json!(0));
        skeleton.insert("issues_remaining".into(), json!(0));
        skeleton.insert("formatted".into(), json!(false));
        skeleton.insert("config_suggestions".into(), json!({}));
        let normalizer = OutputNormalizer::new(
            "repo_path",
            json!(settings.repo_path.display().to_string()),
            "summary",
            skeleton,
        );
        let report = normalizer.normalize(&raw_output);

        let report_path = settings.repo_path.join("lint_report.json");
        report.save(&report_path).await?;

        trace.emit(
            "agent",
            &format!("Linting completed. Report saved to {}", report_path.display()),
        );

        Ok(LintOutcome {
            files_analyzed: report.get_u64("files_analyzed"),
            issues_fixed: report.get_u64("issues_fixed"),
            issues_remaining: report.get_u64("issues_remaining"),
            formatted: report.get_bool("formatted"),
            config_suggestions: report
                .get("config_suggestions")
                .cloned()
                .unwrap_or_else(|| json!({})),
            report_path,
            report,
        })
    }
}
