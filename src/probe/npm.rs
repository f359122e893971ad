//! npm registry probe
//!
//! Resolves the `latest` dist-tag of a package from the npm registry.

use crate::domain::SourceDescriptor;
use crate::error::{ConfigError, ProbeError};
use crate::http::HttpClient;
use crate::probe::{require_param, ResolvedLatest, SourceProbe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// npm registry base URL
const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Probe for the npm registry's latest dist-tag
#[derive(Debug)]
pub struct NpmRegistryProbe {
    package: String,
    client: HttpClient,
}

/// The slice of the package document this probe needs
#[derive(Debug, Deserialize)]
struct NpmPackage {
    #[serde(rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    time: HashMap<String, String>,
}

impl NpmRegistryProbe {
    /// Create a probe for a package name (scoped names included)
    pub fn new(package: impl Into<String>, client: HttpClient) -> Self {
        Self {
            package: package.into(),
            client,
        }
    }

    /// Build from a descriptor; requires the `package` parameter
    pub fn from_descriptor(
        descriptor: &SourceDescriptor,
        client: HttpClient,
    ) -> Result<Self, ConfigError> {
        let package = require_param(&descriptor.package, "npm", "package")?;
        Ok(Self::new(package, client))
    }

    fn package_url(&self) -> String {
        format!("{}/{}", NPM_REGISTRY_URL, self.package)
    }
}

#[async_trait]
impl SourceProbe for NpmRegistryProbe {
    fn source_name(&self) -> &'static str {
        "npm"
    }

    async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError> {
        let response = self
            .client
            .get(&self.package_url(), &self.package, self.source_name())
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProbeError::not_found(&self.package, self.source_name()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProbeError::rate_limited(self.source_name()));
        }
        if !status.is_success() {
            return Err(ProbeError::network(
                &self.package,
                self.source_name(),
                format!("HTTP {}", status),
            ));
        }

        let document: NpmPackage = response.json().await.map_err(|e| {
            ProbeError::parse(&self.package, self.source_name(), format!("bad JSON: {}", e))
        })?;

        let version = document.dist_tags.get("latest").ok_or_else(|| {
            ProbeError::parse(&self.package, self.source_name(), "no latest dist-tag")
        })?;

        let mut latest = ResolvedLatest::version(version);
        if let Some(published_at) = document
            .time
            .get(version)
            .and_then(|t| t.parse::<DateTime<Utc>>().ok())
        {
            latest = latest.with_published_at(published_at);
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn probe(package: &str) -> NpmRegistryProbe {
        let client = HttpClient::new(Duration::from_secs(1)).unwrap();
        NpmRegistryProbe::new(package, client)
    }

    #[test]
    fn test_package_url() {
        assert_eq!(
            probe("typescript").package_url(),
            "https://registry.npmjs.org/typescript"
        );
    }

    #[test]
    fn test_package_url_scoped() {
        assert_eq!(
            probe("@types/node").package_url(),
            "https://registry.npmjs.org/@types/node"
        );
    }

    #[test]
    fn test_from_descriptor_requires_package() {
        let client = HttpClient::new(Duration::from_secs(1)).unwrap();
        let descriptor = SourceDescriptor::of_kind("npm");
        let err = NpmRegistryProbe::from_descriptor(&descriptor, client).unwrap_err();
        assert!(matches!(err, ConfigError::MissingParameter { .. }));
    }

    #[test]
    fn test_document_deserialization() {
        let payload = r#"{
            "name": "typescript",
            "dist-tags": {"latest": "5.4.2", "beta": "5.5.0-beta"},
            "time": {"5.4.2": "2026-03-06T10:00:00.000Z"}
        }"#;
        let doc: NpmPackage = serde_json::from_str(payload).unwrap();
        assert_eq!(doc.dist_tags.get("latest").unwrap(), "5.4.2");
        assert!(doc.time.contains_key("5.4.2"));
    }

    #[test]
    fn test_document_without_time_map() {
        let payload = r#"{"dist-tags": {"latest": "1.0.0"}}"#;
        let doc: NpmPackage = serde_json::from_str(payload).unwrap();
        assert!(doc.time.is_empty());
    }
}
