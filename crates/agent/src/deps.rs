//! The dependency-upgrade planning agent.
//!
//! Scans the repository manifest up front, seeds the conversation with the
//! snapshot, and lets the model work the dependency tools until it emits an
//! upgrade plan. The plan lands in `dependency_plan.json` at the repository
//! root.

use crate::loop_runner::AgentLoop;
use crate::normalize::OutputNormalizer;
use repokeep_core::error::Result;
use repokeep_core::message::Conversation;
use repokeep_core::provider::Provider;
use repokeep_core::report::Report;
use repokeep_core::trace::Trace;
use repokeep_tools::{dependency_registry_with_client, dependency_snapshot, PyPiClient};
use serde_json::{json, Map};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_BRANCH: &str = "repokeep/dependency-updates";
pub const DEFAULT_MAX_STEPS: u32 = 25;

/// Per-run settings for the dependency agent.
#[derive(Debug, Clone)]
pub struct DepsSettings {
    /// Local checkout to analyze
    pub repo_path: PathBuf,

    /// Canonical repository URL (report provenance)
    pub repo_url: String,

    /// Branch name a follow-up PR would use
    pub branch_name: String,

    /// Model invocation budget
    pub max_steps: u32,

    /// Emit progress lines to stdout
    pub verbose: bool,

    /// Plan only; never touch the working tree
    pub dry_run: bool,
}

impl DepsSettings {
    pub fn new(repo_path: impl Into<PathBuf>, repo_url: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            repo_url: repo_url.into(),
            branch_name: DEFAULT_BRANCH.into(),
            max_steps: DEFAULT_MAX_STEPS,
            verbose: false,
            dry_run: true,
        }
    }
}

/// High-level summary of a dependency agent run.
#[derive(Debug)]
pub struct DepsOutcome {
    pub applied_changes: Vec<String>,
    pub pr_branch: String,
    pub report_path: PathBuf,
    pub plan: Report,
}

pub struct DepsAgent {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: Option<u32>,
    pypi: PyPiClient,
    trace: Option<Trace>,
}

impl DepsAgent {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: None,
            pypi: PyPiClient::new(),
            trace: None,
        }
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Point package lookups at a different registry endpoint.
    pub fn with_pypi_client(mut self, pypi: PyPiClient) -> Self {
        self.pypi = pypi;
        self
    }

    /// Route progress lines to a specific sink instead of stdout.
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Analyze the repository and write the upgrade plan.
    pub async fn run(&self, settings: &DepsSettings) -> Result<DepsOutcome> {
        let trace = self
            .trace
            .clone()
            .unwrap_or_else(|| Trace::from_flag(settings.verbose));
        trace.emit("agent", "Starting dependency analysis run.");
        info!(repo = %settings.repo_path.display(), "Dependency analysis run");

        let snapshot = dependency_snapshot(&settings.repo_path, &self.pypi).await?;
        let snapshot_json = serde_json::to_string_pretty(&snapshot)?;

        let system_prompt = format!(
            "You are a release engineering agent that proposes safe dependency upgrades for \
             Python projects. Use the available tools to inspect pyproject.toml and PyPI \
             metadata before recommending changes. Return JSON with keys 'upgrades' (list) \
             and 'notes' (string). Repository context:\n{snapshot_json}"
        );
        let user_prompt = format!(
            "Analyze the Python dependencies declared in the repository located at {}. \
             Identify outdated packages and propose compatible upgrades based on the current \
             specifiers. Prioritize security patches and minor releases unless the specifier \
             allows breaking updates. Produce detailed reasoning for each proposed change in \
             the JSON response.",
            settings.repo_path.display()
        );
        let mut conversation = Conversation::seeded(system_prompt, user_prompt);

        let registry = dependency_registry_with_client(&settings.repo_path, self.pypi.clone());
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
        skeleton.insert("upgrades".into(), json!([]));
        let normalizer =
            OutputNormalizer::new("repo_url", json!(settings.repo_url), "notes", skeleton);
        let plan = normalizer.normalize(&raw_output);

        let report_path = settings.repo_path.join("dependency_plan.json");
        plan.save(&report_path).await?;

        let suggestions = plan.array_len("upgrades");
        trace.emit(
            "agent",
            &format!("Plan generated with {suggestions} suggestions."),
        );

        Ok(DepsOutcome {
            applied_changes: vec![format!(
                "Generated dependency upgrade plan with {suggestions} suggestions."
            )],
            pr_branch: settings.branch_name.clone(),
            report_path,
            plan,
        })
    }
}
