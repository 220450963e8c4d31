//! Tool implementations the repokeep agents expose to the model.
//!
//! Two registries: dependency analysis (manifest inspection + PyPI lookups)
//! and linting (ruff invocations). Each tool folds its own failures into the
//! output it returns so the model can react instead of the run aborting.

pub mod analyze_codebase;
pub mod check_lint;
pub mod format_code;
pub mod latest_version;
pub mod list_dependencies;
pub mod manifest;
pub mod pypi;
pub mod scan_repository;

pub use analyze_codebase::AnalyzeCodebaseTool;
pub use check_lint::CheckLintTool;
pub use format_code::FormatCodeTool;
pub use latest_version::LatestVersionTool;
pub use list_dependencies::ListDependenciesTool;
pub use manifest::{parse_pyproject, DependencyInfo};
pub use pypi::{PackageInfo, PyPiClient};
pub use scan_repository::ScanRepositoryTool;

use repokeep_core::error::ToolError;
use repokeep_core::tool::ToolRegistry;
use std::path::Path;

/// Parse the repository manifest and enrich each dependency with its latest
/// published version. Registry lookups are best-effort; a dependency whose
/// lookup fails keeps `latest_version: None`.
pub async fn dependency_snapshot(
    repo_path: &Path,
    pypi: &PyPiClient,
) -> Result<Vec<DependencyInfo>, ToolError> {
    let mut dependencies = parse_pyproject(repo_path)?;
    for dep in &mut dependencies {
        dep.latest_version = pypi.latest_version_or_none(&dep.name).await;
    }
    Ok(dependencies)
}

/// Build the registry the dependency-upgrade agent runs with.
pub fn dependency_registry(repo_path: &Path) -> ToolRegistry {
    dependency_registry_with_client(repo_path, PyPiClient::new())
}

/// Same as [`dependency_registry`] but with an injected PyPI client, so
/// callers can point lookups at a fixture server.
pub fn dependency_registry_with_client(repo_path: &Path, pypi: PyPiClient) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ListDependenciesTool::new(
        repo_path.to_path_buf(),
        pypi.clone(),
    )));
    registry.register(Box::new(LatestVersionTool::new(pypi)));
    registry
}

/// Build the registry the lint agent runs with.
pub fn linting_registry(repo_path: &Path) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ScanRepositoryTool::new(repo_path.to_path_buf())));
    registry.register(Box::new(CheckLintTool::new(repo_path.to_path_buf())));
    registry.register(Box::new(FormatCodeTool::new(repo_path.to_path_buf())));
    registry.register(Box::new(AnalyzeCodebaseTool::new(repo_path.to_path_buf())));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_registry_exposes_both_tools() {
        let dir = tempfile::tempdir().unwrap();
        let registry = dependency_registry(dir.path());
        let mut names = registry.names();
        names.sort();
        assert_eq!(
            names,
            vec!["fetch_latest_pypi_version", "list_python_dependencies"]
        );
    }

    #[test]
    fn linting_registry_exposes_four_tools() {
        let dir = tempfile::tempdir().unwrap();
        let registry = linting_registry(dir.path());
        let mut names = registry.names();
        names.sort();
        assert_eq!(
            names,
            vec![
                "analyze_codebase_patterns",
                "check_linting_issues",
                "format_code",
                "scan_repository"
            ]
        );
    }
}
