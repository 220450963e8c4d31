//! fetch_latest_pypi_version tool.

use crate::pypi::PyPiClient;
use async_trait::async_trait;
use repokeep_core::error::ToolError;
use repokeep_core::tool::{Tool, ToolOutput};

pub struct LatestVersionTool {
    pypi: PyPiClient,
}

impl LatestVersionTool {
    pub fn new(pypi: PyPiClient) -> Self {
        Self { pypi }
    }
}

#[async_trait]
impl Tool for LatestVersionTool {
    fn name(&self) -> &str {
        "fetch_latest_pypi_version"
    }

    fn description(&self) -> &str {
        "Look up the latest published version of a Python package on PyPI, along with its \
         interpreter requirement. Use this to verify upgrade targets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "package_name": {
                    "type": "string",
                    "description": "Exact package name as published on PyPI (e.g. 'httpx')."
                }
            },
            "required": ["package_name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let package_name = arguments["package_name"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("package_name must be a string".into())
        })?;

        match self.pypi.package_info(package_name).await {
            Ok(info) => {
                let payload =
                    serde_json::to_string_pretty(&info).map_err(|e| ToolError::ExecutionFailed {
                        tool_name: "fetch_latest_pypi_version".into(),
                        reason: e.to_string(),
                    })?;
                Ok(ToolOutput::ok(payload))
            }
            Err(e) => Ok(ToolOutput::failed(format!(
                "Could not resolve '{package_name}' on PyPI: {e}"
            ))),
        }
    }
}
