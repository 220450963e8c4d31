//! scan_repository tool — repository layout survey for the lint agent.

use async_trait::async_trait;
use repokeep_core::error::ToolError;
use repokeep_core::tool::{Tool, ToolOutput};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories that never contain first-party Python sources.
const SKIP_DIRS: &[&str] = &[".venv", "venv", "__pycache__", ".git", "node_modules", ".tox"];

/// File listings are capped so large repos don't blow up the conversation.
const FILE_LIST_CAP: usize = 50;

pub struct ScanRepositoryTool {
    repo_path: PathBuf,
}

impl ScanRepositoryTool {
    pub fn new(repo_path: PathBuf) -> Self {
        Self { repo_path }
    }
}

fn is_skipped(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIP_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Locate the ruff configuration, if any: an explicit `ruff.toml` or
/// `.ruff.toml`, or a `[tool.ruff]` table inside pyproject.toml.
fn find_ruff_config(repo_path: &Path) -> Option<String> {
    for candidate in ["ruff.toml", ".ruff.toml"] {
        if repo_path.join(candidate).exists() {
            return Some(candidate.to_string());
        }
    }
    let manifest = repo_path.join("pyproject.toml");
    if let Ok(raw) = std::fs::read_to_string(&manifest) {
        if let Ok(doc) = toml::from_str::<toml::Value>(&raw) {
            if doc.get("tool").and_then(|t| t.get("ruff")).is_some() {
                return Some("pyproject.toml".to_string());
            }
        }
    }
    None
}

#[async_trait]
impl Tool for ScanRepositoryTool {
    fn name(&self) -> &str {
        "scan_repository"
    }

    fn description(&self) -> &str {
        "Walk the mounted repository and report its Python files and whether a ruff \
         configuration is present. Run this first to understand what you are linting."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let mut python_files: Vec<String> = Vec::new();
        for entry in WalkDir::new(&self.repo_path)
            .into_iter()
            .filter_entry(|e| !is_skipped(e))
        {
            let entry = entry.map_err(|e| ToolError::ExecutionFailed {
                tool_name: "scan_repository".into(),
                reason: format!("walk failed: {e}"),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|x| x.to_str()) != Some("py") {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.repo_path)
                .unwrap_or(entry.path());
            python_files.push(relative.display().to_string());
        }
        python_files.sort();

        let total = python_files.len();
        let config_location = find_ruff_config(&self.repo_path);

        let mut report = serde_json::json!({
            "total_python_files": total,
            "python_files": python_files.iter().take(FILE_LIST_CAP).collect::<Vec<_>>(),
            "has_ruff_config": config_location.is_some(),
            "config_location": config_location,
        });
        if total > FILE_LIST_CAP {
            report["note"] = serde_json::json!(format!(
                "Showing first {FILE_LIST_CAP} of {total} Python files"
            ));
        }

        let payload =
            serde_json::to_string_pretty(&report).map_err(|e| ToolError::ExecutionFailed {
                tool_name: "scan_repository".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolOutput::ok(payload))
    }
}
