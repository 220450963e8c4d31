//! pyproject.toml manifest parsing.
//!
//! Extracts declared dependencies from the `[project]` table: the default
//! `dependencies` list plus every `optional-dependencies` group. Requirement
//! strings follow PEP 508; we only need the package name and the version
//! specifier, so environment markers and extras are stripped.

use repokeep_core::error::ToolError;
use serde::Serialize;
use std::path::Path;

/// A single declared dependency, enriched with registry metadata when the
/// lookup succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyInfo {
    pub name: String,
    pub specifier: String,
    pub latest_version: Option<String>,
    pub source: String,
}

/// Parse the pyproject.toml at the root of `repo_path`.
///
/// A missing manifest yields an empty list (the repository may simply not
/// declare anything); an unparseable manifest is an execution failure the
/// model gets to see.
pub fn parse_pyproject(repo_path: &Path) -> Result<Vec<DependencyInfo>, ToolError> {
    let manifest_path = repo_path.join("pyproject.toml");
    if !manifest_path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(&manifest_path).map_err(|e| ToolError::ExecutionFailed {
        tool_name: "list_python_dependencies".into(),
        reason: format!("failed to read {}: {e}", manifest_path.display()),
    })?;
    parse_pyproject_str(&raw)
}

/// Parse a pyproject.toml document.
pub fn parse_pyproject_str(raw: &str) -> Result<Vec<DependencyInfo>, ToolError> {
    let doc: toml::Value = toml::from_str(raw).map_err(|e| ToolError::ExecutionFailed {
        tool_name: "list_python_dependencies".into(),
        reason: format!("invalid pyproject.toml: {e}"),
    })?;

    let mut results = Vec::new();
    let Some(project) = doc.get("project") else {
        return Ok(results);
    };

    if let Some(deps) = project.get("dependencies").and_then(|d| d.as_array()) {
        for raw_req in deps.iter().filter_map(|d| d.as_str()) {
            if let Some(info) = parse_requirement(raw_req, "default") {
                results.push(info);
            }
        }
    }

    if let Some(groups) = project
        .get("optional-dependencies")
        .and_then(|g| g.as_table())
    {
        for (group, extras) in groups {
            let Some(extras) = extras.as_array() else {
                continue;
            };
            for raw_req in extras.iter().filter_map(|d| d.as_str()) {
                if let Some(info) = parse_requirement(raw_req, &format!("optional:{group}")) {
                    results.push(info);
                }
            }
        }
    }

    Ok(results)
}

/// Split a PEP 508 requirement string into name + specifier.
///
/// Malformed lines are skipped rather than failing the whole manifest.
fn parse_requirement(raw: &str, source: &str) -> Option<DependencyInfo> {
    // Drop environment markers ("; python_version < '3.12'")
    let raw = raw.split(';').next().unwrap_or("").trim();
    if raw.is_empty() {
        return None;
    }

    let name_end = raw
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .unwrap_or(raw.len());
    let name = &raw[..name_end];
    if name.is_empty() {
        return None;
    }

    let mut rest = raw[name_end..].trim();
    // Strip extras: "uvicorn[standard]>=0.23" -> ">=0.23"
    if rest.starts_with('[') {
        match rest.find(']') {
            Some(close) => rest = rest[close + 1..].trim(),
            None => return None,
        }
    }

    let specifier = if rest.is_empty() { "*" } else { rest };

    Some(DependencyInfo {
        name: name.to_string(),
        specifier: specifier.to_string(),
        latest_version: None,
        source: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[project]
name = "demo"
dependencies = [
    "httpx>=0.25,<1.0",
    "pydantic ~= 2.5",
    "click",
    "uvicorn[standard]>=0.23",
]

[project.optional-dependencies]
dev = ["pytest>=7", "ruff"]
docs = ["mkdocs"]
"#;

    #[test]
    fn parses_default_dependencies() {
        let deps = parse_pyproject_str(MANIFEST).unwrap();
        let defaults: Vec<_> = deps.iter().filter(|d| d.source == "default").collect();
        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults[0].name, "httpx");
        assert_eq!(defaults[0].specifier, ">=0.25,<1.0");
    }

    #[test]
    fn bare_name_gets_wildcard_specifier() {
        let deps = parse_pyproject_str(MANIFEST).unwrap();
        let click = deps.iter().find(|d| d.name == "click").unwrap();
        assert_eq!(click.specifier, "*");
    }

    #[test]
    fn extras_are_stripped_from_specifier() {
        let deps = parse_pyproject_str(MANIFEST).unwrap();
        let uvicorn = deps.iter().find(|d| d.name == "uvicorn").unwrap();
        assert_eq!(uvicorn.specifier, ">=0.23");
    }

    #[test]
    fn optional_groups_are_tagged() {
        let deps = parse_pyproject_str(MANIFEST).unwrap();
        let pytest = deps.iter().find(|d| d.name == "pytest").unwrap();
        assert_eq!(pytest.source, "optional:dev");
        let mkdocs = deps.iter().find(|d| d.name == "mkdocs").unwrap();
        assert_eq!(mkdocs.source, "optional:docs");
    }

    #[test]
    fn environment_markers_are_dropped() {
        let info = parse_requirement("tomli>=2; python_version < '3.11'", "default").unwrap();
        assert_eq!(info.name, "tomli");
        assert_eq!(info.specifier, ">=2");
    }

    #[test]
    fn malformed_requirement_is_skipped() {
        assert!(parse_requirement(">=1.0", "default").is_none());
        assert!(parse_requirement("", "default").is_none());
        assert!(parse_requirement("pkg[unclosed>=1", "default").is_none());
    }

    #[test]
    fn manifest_without_optional_groups_parses() {
        let deps = parse_pyproject_str(
            "[project]\nname = \"demo\"\ndependencies = [\"httpx>=0.25\"]\n",
        )
        .unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "httpx");
        assert_eq!(deps[0].source, "default");
    }

    #[test]
    fn project_table_without_dependency_lists_yields_empty() {
        let deps = parse_pyproject_str("[project]\nname = \"demo\"\n").unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn missing_project_table_yields_empty() {
        let deps = parse_pyproject_str("[build-system]\nrequires = []\n").unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_pyproject_str("project = [").is_err());
    }

    #[test]
    fn missing_manifest_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let deps = parse_pyproject(dir.path()).unwrap();
        assert!(deps.is_empty());
    }
}
