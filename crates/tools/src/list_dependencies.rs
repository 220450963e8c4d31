//! list_python_dependencies tool — manifest snapshot for the deps agent.

use crate::dependency_snapshot;
use crate::pypi::PyPiClient;
use async_trait::async_trait;
use repokeep_core::error::ToolError;
use repokeep_core::tool::{Tool, ToolOutput};
use std::path::PathBuf;

pub struct ListDependenciesTool {
    repo_path: PathBuf,
    pypi: PyPiClient,
}

impl ListDependenciesTool {
    pub fn new(repo_path: PathBuf, pypi: PyPiClient) -> Self {
        Self { repo_path, pypi }
    }
}

#[async_trait]
impl Tool for ListDependenciesTool {
    fn name(&self) -> &str {
        "list_python_dependencies"
    }

    fn description(&self) -> &str {
        "Inspect the pyproject.toml in the mounted repository and return all declared Python \
         dependencies (including optional dependency groups when requested). Use this before \
         planning upgrades."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "include_optional": {
                    "type": "boolean",
                    "description": "Set to false to omit optional dependency groups when summarizing the repo."
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let include_optional = arguments["include_optional"].as_bool().unwrap_or(true);

        let mut dependencies = dependency_snapshot(&self.repo_path, &self.pypi).await?;
        if !include_optional {
            dependencies.retain(|d| !d.source.starts_with("optional:"));
        }

        let payload = serde_json::to_string_pretty(&dependencies).map_err(|e| {
            ToolError::ExecutionFailed {
                tool_name: "list_python_dependencies".into(),
                reason: e.to_string(),
            }
        })?;
        Ok(ToolOutput::ok(payload))
    }
}
