//! PyPI JSON API client.
//!
//! One GET per package: `/pypi/<name>/json`. The base URL is injectable so
//! tests can point at a local fixture server instead of pypi.org.

use repokeep_core::error::ToolError;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://pypi.org";

/// What the deps agent needs to know about a published package.
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub package_name: String,
    pub latest_version: Option<String>,
    pub requires_python: Option<String>,
}

#[derive(Clone)]
pub struct PyPiClient {
    base_url: String,
    client: reqwest::Client,
}

impl PyPiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch the latest published version and interpreter requirement.
    pub async fn package_info(&self, package_name: &str) -> Result<PackageInfo, ToolError> {
        let url = format!("{}/pypi/{package_name}/json", self.base_url);
        debug!(package = %package_name, "Querying PyPI");

        let response = self.client.get(&url).send().await.map_err(|e| {
            ToolError::ExecutionFailed {
                tool_name: "fetch_latest_pypi_version".into(),
                reason: format!("PyPI request failed: {e}"),
            }
        })?;

        if !response.status().is_success() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "fetch_latest_pypi_version".into(),
                reason: format!(
                    "PyPI returned status {} for package '{package_name}'",
                    response.status().as_u16()
                ),
            });
        }

        let body: PyPiResponse = response.json().await.map_err(|e| {
            ToolError::ExecutionFailed {
                tool_name: "fetch_latest_pypi_version".into(),
                reason: format!("unparseable PyPI response: {e}"),
            }
        })?;

        Ok(PackageInfo {
            package_name: package_name.to_string(),
            latest_version: body.info.version,
            requires_python: body.info.requires_python,
        })
    }

    /// Best-effort lookup for the manifest pre-scan: failures degrade to
    /// an unknown latest version instead of aborting the scan.
    pub async fn latest_version_or_none(&self, package_name: &str) -> Option<String> {
        match self.package_info(package_name).await {
            Ok(info) => info.latest_version,
            Err(e) => {
                debug!(package = %package_name, error = %e, "PyPI lookup failed, continuing");
                None
            }
        }
    }
}

impl Default for PyPiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PyPiResponse {
    info: PyPiInfo,
}

#[derive(Debug, Deserialize)]
struct PyPiInfo {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    requires_python: Option<String>,
}
