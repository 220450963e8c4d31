//! Report — the final structured artifact of an agent run.
//!
//! A report is a JSON object created exactly once, after the loop reaches
//! a terminal state, and persisted by the caller in a single write. It is
//! never mutated after normalization apart from provenance backfill.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A named-field report with a provenance entry identifying the subject
/// repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    fields: Map<String, Value>,
}

impl Report {
    /// Create a report from an already-parsed JSON object.
    pub fn from_object(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field, replacing any existing value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Set a field only when it is absent (provenance backfill).
    pub fn set_if_absent(&mut self, key: &str, value: Value) {
        if !self.fields.contains_key(key) {
            self.fields.insert(key.to_string(), value);
        }
    }

    /// Convenience accessors for the common report field shapes.
    pub fn get_u64(&self, key: &str) -> u64 {
        self.fields.get(key).and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.fields.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Number of upgrade suggestions / array entries under a key.
    pub fn array_len(&self, key: &str) -> usize {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// The underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Render as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.fields)?)
    }

    /// Write the report to a file. One write, after the run terminates —
    /// external consumers never observe a partial report.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let body = self.to_json_pretty()?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Report {
        let mut fields = Map::new();
        fields.insert("upgrades".into(), json!([{"name": "httpx"}]));
        fields.insert("notes".into(), json!("one upgrade proposed"));
        Report::from_object(fields)
    }

    #[test]
    fn set_if_absent_does_not_overwrite() {
        let mut report = sample();
        report.set_if_absent("notes", json!("ignored"));
        assert_eq!(report.get_str("notes"), Some("one upgrade proposed"));

        report.set_if_absent("repo_url", json!("https://example.com/repo"));
        assert_eq!(report.get_str("repo_url"), Some("https://example.com/repo"));
    }

    #[test]
    fn typed_accessors_default_on_missing() {
        let report = sample();
        assert_eq!(report.get_u64("files_analyzed"), 0);
        assert!(!report.get_bool("formatted"));
        assert_eq!(report.array_len("upgrades"), 1);
    }

    #[tokio::test]
    async fn save_writes_parseable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_plan.json");

        sample().save(&path).await.unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["notes"], json!("one upgrade proposed"));
    }

    #[test]
    fn transparent_serialization() {
        let report = sample();
        let json = serde_json::to_string(&report).unwrap();
        let roundtrip: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, report);
    }
}
