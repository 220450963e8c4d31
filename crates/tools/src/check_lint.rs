//! check_linting_issues tool — runs `ruff check` and summarizes the output.

use async_trait::async_trait;
use repokeep_core::error::ToolError;
use repokeep_core::tool::{Tool, ToolOutput};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

pub struct CheckLintTool {
    repo_path: PathBuf,
}

impl CheckLintTool {
    pub fn new(repo_path: PathBuf) -> Self {
        Self { repo_path }
    }
}

/// Aggregate a ruff JSON issue array into the compact summary the model sees.
pub(crate) fn summarize_issues(issues: &[serde_json::Value], auto_fix: bool) -> serde_json::Value {
    let mut by_file: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_code: BTreeMap<String, u64> = BTreeMap::new();

    for issue in issues {
        let file = issue["filename"].as_str().unwrap_or("unknown").to_string();
        let code = issue["code"].as_str().unwrap_or("unknown").to_string();
        *by_file.entry(file).or_insert(0) += 1;
        *by_code.entry(code).or_insert(0) += 1;
    }

    serde_json::json!({
        "total_issues": issues.len(),
        "auto_fixed": auto_fix,
        "issues_by_file": by_file,
        "issues_by_code": by_code,
        "sample_issues": issues.iter().take(10).collect::<Vec<_>>(),
    })
}

#[async_trait]
impl Tool for CheckLintTool {
    fn name(&self) -> &str {
        "check_linting_issues"
    }

    fn description(&self) -> &str {
        "Run ruff check to identify linting issues. Can optionally auto-fix safe issues by \
         setting auto_fix=true. Returns a summary of issues found."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "auto_fix": {
                    "type": "boolean",
                    "description": "Automatically fix safe issues using ruff --fix."
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let auto_fix = arguments["auto_fix"].as_bool().unwrap_or(false);

        let mut cmd = Command::new("ruff");
        cmd.arg("check")
            .arg(&self.repo_path)
            .arg("--output-format=json")
            .current_dir(&self.repo_path);
        if auto_fix {
            cmd.arg("--fix");
        }

        debug!(repo = %self.repo_path.display(), auto_fix, "Running ruff check");

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                return Ok(ToolOutput::failed(format!(
                    "Failed to run ruff check: {e}. Is ruff installed?"
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Ruff emits a JSON array on stdout even when issues are found.
        let issues: Vec<serde_json::Value> = if stdout.trim().is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str(stdout.trim()) {
                Ok(issues) => issues,
                Err(_) => {
                    let fallback = serde_json::json!({
                        "error": "Failed to parse ruff output",
                        "stdout": stdout.trim(),
                        "stderr": stderr.trim(),
                    });
                    return Ok(ToolOutput::failed(fallback.to_string()));
                }
            }
        };

        let summary = summarize_issues(&issues, auto_fix);
        let payload =
            serde_json::to_string_pretty(&summary).map_err(|e| ToolError::ExecutionFailed {
                tool_name: "check_linting_issues".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolOutput::ok(payload))
    }
}
