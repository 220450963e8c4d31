//! Structured output normalization.
//!
//! The model's final message is supposed to be a JSON object, but in
//! practice it arrives in three shapes: bare JSON, JSON wrapped in a
//! markdown code fence, or free prose. Normalization tries those in order
//! and always produces a report: the prose case yields the configured
//! skeleton with the raw text preserved under the notes field. The
//! provenance field is backfilled whenever the model left it out.

use regex::Regex;
use repokeep_core::report::Report;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn first_fenced_block(raw: &str) -> Option<&str> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n```").ok())
        .as_ref()?;
    re.captures(raw)?.get(1).map(|m| m.as_str())
}

pub struct OutputNormalizer {
    provenance_field: String,
    provenance_value: Value,
    notes_field: String,
    skeleton: Map<String, Value>,
}

impl OutputNormalizer {
    /// Configure a normalizer.
    ///
    /// `skeleton` is the shape of the fallback report (zeros, empty lists);
    /// the provenance and notes fields are added on top of it.
    pub fn new(
        provenance_field: impl Into<String>,
        provenance_value: Value,
        notes_field: impl Into<String>,
        skeleton: Map<String, Value>,
    ) -> Self {
        Self {
            provenance_field: provenance_field.into(),
            provenance_value,
            notes_field: notes_field.into(),
            skeleton,
        }
    }

    /// Normalize raw model output into a report. Total: never fails.
    pub fn normalize(&self, raw: &str) -> Report {
        if let Some(report) = self.try_parse(raw) {
            return report;
        }
        if let Some(block) = first_fenced_block(raw) {
            if let Some(report) = self.try_parse(block) {
                return report;
            }
        }
        self.fallback(raw)
    }

    /// Parse text as a JSON object and backfill provenance. Non-object
    /// JSON (arrays, scalars) does not count as a report.
    fn try_parse(&self, text: &str) -> Option<Report> {
        let value: Value = serde_json::from_str(text.trim()).ok()?;
        let Value::Object(fields) = value else {
            return None;
        };
        let mut report = Report::from_object(fields);
        report.set_if_absent(&self.provenance_field, self.provenance_value.clone());
        Some(report)
    }

    fn fallback(&self, raw: &str) -> Report {
        let mut fields = self.skeleton.clone();
        fields.insert(
            self.provenance_field.clone(),
            self.provenance_value.clone(),
        );
        fields.insert(self.notes_field.clone(), Value::String(raw.trim().into()));
        Report::from_object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_normalizer() -> OutputNormalizer {
        let mut skeleton = Map::new();
        skeleton.insert("upgrades".into(), json!([]));
        OutputNormalizer::new(
            "repo_url",
            json!("https://example.com/demo"),
            "notes",
            skeleton,
        )
    }

    #[test]
    fn bare_json_passes_through_with_provenance() {
        let report = plan_normalizer().normalize(
            r#"{"upgrades": [{"name": "httpx"}], "notes": "one bump"}"#,
        );
        assert_eq!(report.array_len("upgrades"), 1);
        assert_eq!(report.get_str("repo_url"), Some("https://example.com/demo"));
    }

    #[test]
    fn existing_provenance_is_not_overwritten() {
        let report = plan_normalizer()
            .normalize(r#"{"repo_url": "https://example.com/other", "upgrades": []}"#);
        assert_eq!(report.get_str("repo_url"), Some("https://example.com/other"));
    }

    #[test]
    fn fenced_json_block_is_extracted() {
        let raw = "Here is the plan:\n```json\n{\"upgrades\": [], \"notes\": \"ok\"}\n```\nLet me know.";
        let report = plan_normalizer().normalize(raw);
        assert_eq!(report.get_str("notes"), Some("ok"));
        assert_eq!(report.get_str("repo_url"), Some("https://example.com/demo"));
    }

    #[test]
    fn unlabeled_fence_works_too() {
        let raw = "```\n{\"upgrades\": [], \"notes\": \"plain fence\"}\n```";
        let report = plan_normalizer().normalize(raw);
        assert_eq!(report.get_str("notes"), Some("plain fence"));
    }

    #[test]
    fn first_fence_wins() {
        let raw = "```json\n{\"notes\": \"first\"}\n```\n```json\n{\"notes\": \"second\"}\n```";
        let report = plan_normalizer().normalize(raw);
        assert_eq!(report.get_str("notes"), Some("first"));
    }

    #[test]
    fn unparseable_fence_falls_back() {
        let raw = "```json\nnot json at all\n```";
        let report = plan_normalizer().normalize(raw);
        assert_eq!(report.array_len("upgrades"), 0);
        assert_eq!(report.get_str("notes"), Some(raw.trim()));
    }

    #[test]
    fn non_object_json_falls_back() {
        let report = plan_normalizer().normalize(r#"["not", "an", "object"]"#);
        assert_eq!(report.get_str("notes"), Some(r#"["not", "an", "object"]"#));
        assert_eq!(report.array_len("upgrades"), 0);
    }

    #[test]
    fn prose_yields_total_fallback() {
        let report =
            plan_normalizer().normalize("  I could not produce a structured plan, sorry.  ");
        assert_eq!(report.get_str("repo_url"), Some("https://example.com/demo"));
        assert_eq!(report.array_len("upgrades"), 0);
        assert_eq!(
            report.get_str("notes"),
            Some("I could not produce a structured plan, sorry.")
        );
    }

    #[test]
    fn empty_text_yields_fallback_with_empty_notes() {
        let report = plan_normalizer().normalize("   ");
        assert_eq!(report.array_len("upgrades"), 0);
        assert_eq!(report.get_str("notes"), Some(""));
        assert_eq!(report.get_str("repo_url"), Some("https://example.com/demo"));
    }

    #[test]
    fn well_formed_input_normalizes_idempotently() {
        let normalizer = plan_normalizer();
        let first = normalizer.normalize(r#"{"a": 1, "b": "x"}"#);
        assert_eq!(first.get_u64("a"), 1);
        assert_eq!(first.get_str("b"), Some("x"));
        assert_eq!(first.get_str("repo_url"), Some("https://example.com/demo"));

        let body = first.to_json_pretty().unwrap();
        let second = normalizer.normalize(&body);
        assert_eq!(first, second);
    }

    #[test]
    fn normalization_is_idempotent() {
        let normalizer = plan_normalizer();
        let first = normalizer.normalize("free-form answer");
        let body = first.to_json_pretty().unwrap();
        let second = normalizer.normalize(&body);
        assert_eq!(first, second);
    }
}
