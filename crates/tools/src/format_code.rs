//! format_code tool — runs `ruff format`, optionally in check-only mode.

use async_trait::async_trait;
use repokeep_core::error::ToolError;
use repokeep_core::tool::{Tool, ToolOutput};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

pub struct FormatCodeTool {
    repo_path: PathBuf,
}

impl FormatCodeTool {
    pub fn new(repo_path: PathBuf) -> Self {
        Self { repo_path }
    }
}

pub(crate) fn format_status(check_only: bool, exit_ok: bool) -> &'static str {
    match (check_only, exit_ok) {
        (true, true) => "All files already formatted",
        (true, false) => "Some files would be reformatted",
        (false, true) => "Files formatted successfully",
        (false, false) => "Formatting completed with warnings",
    }
}

#[async_trait]
impl Tool for FormatCodeTool {
    fn name(&self) -> &str {
        "format_code"
    }

    fn description(&self) -> &str {
        "Format code using ruff format. Can check if formatting is needed without making \
         changes by setting check_only=true."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "check_only": {
                    "type": "boolean",
                    "description": "Only check whether code would be reformatted, without writing changes."
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let check_only = arguments["check_only"].as_bool().unwrap_or(false);

        let mut cmd = Command::new("ruff");
        cmd.arg("format").arg(&self.repo_path).current_dir(&self.repo_path);
        if check_only {
            cmd.arg("--check");
        }

        debug!(repo = %self.repo_path.display(), check_only, "Running ruff format");

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                return Ok(ToolOutput::failed(format!(
                    "Failed to run ruff format: {e}. Is ruff installed?"
                )))
            }
        };

        let report = serde_json::json!({
            "status": format_status(check_only, output.status.success()),
            "check_only": check_only,
            "stdout": String::from_utf8_lossy(&output.stdout).trim(),
            "stderr": String::from_utf8_lossy(&output.stderr).trim(),
        });

        let payload =
            serde_json::to_string_pretty(&report).map_err(|e| ToolError::ExecutionFailed {
                tool_name: "format_code".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolOutput::ok(payload))
    }
}
