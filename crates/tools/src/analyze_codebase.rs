//! analyze_codebase_patterns tool — runs ruff with every rule enabled and
//! turns the violations into configuration suggestions.

use async_trait::async_trait;
use repokeep_core::error::ToolError;
use repokeep_core::tool::{Tool, ToolOutput};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

pub struct AnalyzeCodebaseTool {
    repo_path: PathBuf,
}

impl AnalyzeCodebaseTool {
    pub fn new(repo_path: PathBuf) -> Self {
        Self { repo_path }
    }
}

fn category_description(category: &str) -> String {
    match category {
        "E" => "pycodestyle errors".into(),
        "W" => "pycodestyle warnings".into(),
        "F" => "Pyflakes".into(),
        "C" => "mccabe complexity".into(),
        "I" => "isort imports".into(),
        "N" => "pep8-naming".into(),
        "D" => "pydocstyle documentation".into(),
        "UP" => "pyupgrade".into(),
        "S" => "flake8-bandit security".into(),
        "B" => "flake8-bugbear".into(),
        "A" => "flake8-builtins".into(),
        "COM" => "flake8-commas".into(),
        "T" => "flake8-print".into(),
        "Q" => "flake8-quotes".into(),
        "RET" => "flake8-return".into(),
        "SIM" => "flake8-simplify".into(),
        "ARG" => "flake8-unused-arguments".into(),
        "PTH" => "flake8-use-pathlib".into(),
        "PD" => "pandas-vet".into(),
        "PL" => "Pylint".into(),
        "RUF" => "Ruff-specific rules".into(),
        other => format!("{other} rules"),
    }
}

#[derive(Debug)]
struct CategoryStats {
    count: u64,
    codes: BTreeSet<String>,
}

/// Group issues by rule category (the non-digit prefix of the rule code).
fn categorize(issues: &[serde_json::Value]) -> BTreeMap<String, CategoryStats> {
    let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();
    for issue in issues {
        let code = issue["code"].as_str().unwrap_or("unknown");
        let category: String = code.chars().filter(|c| !c.is_ascii_digit()).collect();
        let entry = categories.entry(category).or_insert_with(|| CategoryStats {
            count: 0,
            codes: BTreeSet::new(),
        });
        entry.count += 1;
        entry.codes.insert(code.to_string());
    }
    categories
}

/// Suggest which rule sets to enable given the violations found.
fn rule_suggestions(categories: &BTreeMap<String, CategoryStats>) -> serde_json::Value {
    let mut recommended: Vec<&str> = Vec::new();
    let mut optional: Vec<&str> = Vec::new();

    for (category, stats) in categories {
        match category.as_str() {
            "I" | "UP" | "B" | "SIM" => {
                if stats.count > 5 {
                    recommended.push(category);
                } else if stats.count > 0 {
                    optional.push(category);
                }
            }
            "D" | "S" | "N" => optional.push(category),
            _ => {}
        }
    }

    serde_json::json!({
        "essential": ["E", "F", "W"],
        "recommended": recommended,
        "optional": optional,
    })
}

pub(crate) fn build_analysis(issues: &[serde_json::Value]) -> serde_json::Value {
    let categories = categorize(issues);
    let suggestions = rule_suggestions(&categories);

    let categories_json: BTreeMap<String, serde_json::Value> = categories
        .iter()
        .map(|(category, stats)| {
            (
                category.clone(),
                serde_json::json!({
                    "count": stats.count,
                    "codes": stats.codes.iter().collect::<Vec<_>>(),
                    "description": category_description(category),
                }),
            )
        })
        .collect();

    serde_json::json!({
        "total_potential_issues": issues.len(),
        "categories": categories_json,
        "suggested_rules": suggestions,
        "note": "These are suggestions based on common patterns. Review before applying.",
    })
}

#[async_trait]
impl Tool for AnalyzeCodebaseTool {
    fn name(&self) -> &str {
        "analyze_codebase_patterns"
    }

    fn description(&self) -> &str {
        "Analyze the codebase to identify common patterns and suggest appropriate ruff rules. \
         This helps recommend configuration improvements based on actual code patterns."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let mut cmd = Command::new("ruff");
        cmd.arg("check")
            .arg(&self.repo_path)
            .arg("--select=ALL")
            .arg("--output-format=json")
            .current_dir(&self.repo_path);

        debug!(repo = %self.repo_path.display(), "Analyzing codebase with all rules");

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                return Ok(ToolOutput::failed(format!(
                    "Failed to analyze codebase: {e}. Is ruff installed?"
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let issues: Vec<serde_json::Value> = if stdout.trim().is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str(stdout.trim()) {
                Ok(issues) => issues,
                Err(_) => {
                    let fallback = serde_json::json!({
                        "error": "Failed to parse ruff output",
                        "raw": stdout.trim(),
                    });
                    return Ok(ToolOutput::failed(fallback.to_string()));
                }
            }
        };

        let analysis = build_analysis(&issues);
        let payload =
            serde_json::to_string_pretty(&analysis).map_err(|e| ToolError::ExecutionFailed {
                tool_name: "analyze_codebase_patterns".into(),
                reason: e.to_string(),
            })?;
        Ok(ToolOutput::ok(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(code: &str) -> serde_json::Value {
        serde_json::json!({"filename": "src/app.py", "code": code})
    }

    #[test]
    fn categories_strip_digits_and_collect_codes() {
        let issues = vec![issue("UP006"), issue("UP007"), issue("E501")];
        let analysis = build_analysis(&issues);
        assert_eq!(analysis["total_potential_issues"], 3);
        assert_eq!(analysis["categories"]["UP"]["count"], 2);
        assert_eq!(
            analysis["categories"]["UP"]["codes"],
            serde_json::json!(["UP006", "UP007"])
        );
        assert_eq!(analysis["categories"]["UP"]["description"], "pyupgrade");
    }

    #[test]
    fn heavy_categories_are_recommended() {
        let issues: Vec<_> = (0..6).map(|_| issue("I001")).collect();
        let analysis = build_analysis(&issues);
        assert_eq!(analysis["suggested_rules"]["recommended"], serde_json::json!(["I"]));
    }

    #[test]
    fn light_categories_stay_optional() {
        let issues = vec![issue("B008"), issue("S101")];
        let analysis = build_analysis(&issues);
        assert_eq!(analysis["suggested_rules"]["recommended"], serde_json::json!([]));
        assert_eq!(
            analysis["suggested_rules"]["optional"],
            serde_json::json!(["B", "S"])
        );
    }

    #[test]
    fn essentials_are_always_suggested() {
        let analysis = build_analysis(&[]);
        assert_eq!(
            analysis["suggested_rules"]["essential"],
            serde_json::json!(["E", "F", "W"])
        );
    }

    #[test]
    fn unknown_category_gets_generic_description() {
        let issues = vec![issue("XYZ100")];
        let analysis = build_analysis(&issues);
        assert_eq!(analysis["categories"]["XYZ"]["description"], "XYZ rules");
    }
}
