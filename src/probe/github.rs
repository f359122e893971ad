//! GitHub releases probe
//!
//! Resolves the newest non-draft release tag for an owner/repo, skipping
//! prereleases unless the descriptor opts in. Tags are normalized by
//! stripping a configurable prefix ("v" by default) so they compare
//! against detected versions.

use crate::domain::SourceDescriptor;
use crate::error::{ConfigError, ProbeError};
use crate::http::HttpClient;
use crate::probe::{require_param, ResolvedLatest, SourceProbe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GitHub API base URL
const GITHUB_API_URL: &str = "https://api.github.com";

/// Releases fetched per query; the newest eligible tag is near the top
const RELEASES_PER_PAGE: usize = 30;

/// Probe for GitHub release tags
#[derive(Debug)]
pub struct GithubReleaseProbe {
    owner: String,
    repo: String,
    tag_prefix: String,
    include_prerelease: bool,
    client: HttpClient,
}

/// Release entry as returned by the releases endpoint
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    published_at: Option<DateTime<Utc>>,
}

impl GithubReleaseProbe {
    /// Create a probe for an owner/repo pair
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        tag_prefix: impl Into<String>,
        include_prerelease: bool,
        client: HttpClient,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            tag_prefix: tag_prefix.into(),
            include_prerelease,
            client,
        }
    }

    /// Build from a descriptor; requires `owner` and `repo`
    pub fn from_descriptor(
        descriptor: &SourceDescriptor,
        client: HttpClient,
    ) -> Result<Self, ConfigError> {
        let owner = require_param(&descriptor.owner, "github-release", "owner")?;
        let repo = require_param(&descriptor.repo, "github-release", "repo")?;
        let tag_prefix = descriptor.tag_prefix.clone().unwrap_or_else(|| "v".to_string());
        Ok(Self::new(
            owner,
            repo,
            tag_prefix,
            descriptor.include_prerelease,
            client,
        ))
    }

    fn subject(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases?per_page={}",
            GITHUB_API_URL, self.owner, self.repo, RELEASES_PER_PAGE
        )
    }

    fn normalize_tag(&self, tag: &str) -> String {
        tag.strip_prefix(&self.tag_prefix).unwrap_or(tag).to_string()
    }
}

#[async_trait]
impl SourceProbe for GithubReleaseProbe {
    fn source_name(&self) -> &'static str {
        "github"
    }

    async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError> {
        let subject = self.subject();
        let response = self
            .client
            .get(&self.releases_url(), &subject, self.source_name())
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProbeError::not_found(&subject, self.source_name()));
        }
        if status == reqwest::StatusCode::FORBIDDEN && rate_limit_exhausted(&response) {
            return Err(ProbeError::rate_limited(self.source_name()));
        }
        if !status.is_success() {
            return Err(ProbeError::network(
                &subject,
                self.source_name(),
                format!("HTTP {}", status),
            ));
        }

        let releases: Vec<Release> = response.json().await.map_err(|e| {
            ProbeError::parse(&subject, self.source_name(), format!("bad JSON: {}", e))
        })?;

        // the endpoint returns newest first
        let newest = releases
            .into_iter()
            .find(|r| !r.draft && (self.include_prerelease || !r.prerelease))
            .ok_or_else(|| ProbeError::not_found(&subject, self.source_name()))?;

        let mut latest = ResolvedLatest::version(self.normalize_tag(&newest.tag_name));
        if let Some(published_at) = newest.published_at {
            latest = latest.with_published_at(published_at);
        }
        Ok(latest)
    }
}

fn rate_limit_exhausted(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn probe(include_prerelease: bool) -> GithubReleaseProbe {
        let client = HttpClient::new(Duration::from_secs(1)).unwrap();
        GithubReleaseProbe::new("BurntSushi", "ripgrep", "v", include_prerelease, client)
    }

    #[test]
    fn test_releases_url() {
        assert_eq!(
            probe(false).releases_url(),
            "https://api.github.com/repos/BurntSushi/ripgrep/releases?per_page=30"
        );
    }

    #[test]
    fn test_normalize_tag_strips_prefix() {
        let p = probe(false);
        assert_eq!(p.normalize_tag("v14.1.0"), "14.1.0");
        assert_eq!(p.normalize_tag("14.1.0"), "14.1.0");
    }

    #[test]
    fn test_normalize_tag_custom_prefix() {
        let client = HttpClient::new(Duration::from_secs(1)).unwrap();
        let p = GithubReleaseProbe::new("o", "r", "release-", false, client);
        assert_eq!(p.normalize_tag("release-2.4"), "2.4");
        assert_eq!(p.normalize_tag("v2.4"), "v2.4");
    }

    #[test]
    fn test_from_descriptor_defaults() {
        let client = HttpClient::new(Duration::from_secs(1)).unwrap();
        let mut descriptor = SourceDescriptor::of_kind("github-release");
        descriptor.owner = Some("sharkdp".to_string());
        descriptor.repo = Some("fd".to_string());

        let p = GithubReleaseProbe::from_descriptor(&descriptor, client).unwrap();
        assert_eq!(p.tag_prefix, "v");
        assert!(!p.include_prerelease);
        assert_eq!(p.subject(), "sharkdp/fd");
    }

    #[test]
    fn test_from_descriptor_missing_repo() {
        let client = HttpClient::new(Duration::from_secs(1)).unwrap();
        let mut descriptor = SourceDescriptor::of_kind("github-release");
        descriptor.owner = Some("sharkdp".to_string());

        let err = GithubReleaseProbe::from_descriptor(&descriptor, client).unwrap_err();
        assert!(matches!(err, ConfigError::MissingParameter { ref param, .. } if param == "repo"));
    }

    #[test]
    fn test_release_filtering() {
        // deserialization + filter logic without the network
        let payload = r#"[
            {"tag_name": "v2.0.0-rc.1", "prerelease": true, "draft": false, "published_at": null},
            {"tag_name": "v1.9.0", "prerelease": false, "draft": true, "published_at": null},
            {"tag_name": "v1.8.2", "prerelease": false, "draft": false,
             "published_at": "2026-01-10T12:00:00Z"}
        ]"#;
        let releases: Vec<Release> = serde_json::from_str(payload).unwrap();

        let stable = releases
            .iter()
            .find(|r| !r.draft && !r.prerelease)
            .unwrap();
        assert_eq!(stable.tag_name, "v1.8.2");
        assert!(stable.published_at.is_some());

        let with_prerelease = releases.iter().find(|r| !r.draft).unwrap();
        assert_eq!(with_prerelease.tag_name, "v2.0.0-rc.1");
    }
}
