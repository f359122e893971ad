//! Git remote commit probe
//!
//! Resolves the HEAD commit of a remote branch with `git ls-remote`,
//! without cloning. The result is a commit hash, not a version: the
//! engine compares it by equality only.

use crate::command::{argv, CommandRunner};
use crate::domain::SourceDescriptor;
use crate::error::{ConfigError, ProbeError};
use crate::probe::{require_param, ResolvedLatest, SourceProbe};
use async_trait::async_trait;
use std::sync::Arc;

/// Probe for a remote git branch head
#[derive(Debug)]
pub struct GitCommitProbe {
    url: String,
    branch: Option<String>,
    runner: Arc<dyn CommandRunner>,
}

impl GitCommitProbe {
    /// Create a probe for a remote URL; without a branch the remote HEAD
    /// is resolved
    pub fn new(
        url: impl Into<String>,
        branch: Option<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            url: url.into(),
            branch,
            runner,
        }
    }

    /// Build from a descriptor; requires the `url` parameter
    pub fn from_descriptor(
        descriptor: &SourceDescriptor,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ConfigError> {
        let url = require_param(&descriptor.url, "git-commit", "url")?;
        Ok(Self::new(url, descriptor.branch.clone(), runner))
    }

    fn command(&self) -> Vec<String> {
        match &self.branch {
            Some(branch) => argv(&["git", "ls-remote", &self.url, branch]),
            None => argv(&["git", "ls-remote", &self.url, "HEAD"]),
        }
    }

    fn subject(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SourceProbe for GitCommitProbe {
    fn source_name(&self) -> &'static str {
        "git"
    }

    async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError> {
        let output = self.runner.run(&self.command()).map_err(|e| {
            ProbeError::network(self.subject(), "git", format!("failed to run git: {}", e))
        })?;

        if !output.success() {
            return Err(ProbeError::network(
                self.subject(),
                "git",
                format!(
                    "git ls-remote exited with status {}: {}",
                    output.exit_code,
                    output.stderr.trim()
                ),
            ));
        }

        // "HASH\trefs/heads/main"; an empty listing means the ref does
        // not exist on the remote
        let hash = output
            .stdout
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("");

        if hash.is_empty() {
            return Err(ProbeError::not_found(self.subject(), "git"));
        }
        if hash.len() != 40 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ProbeError::parse(
                self.subject(),
                "git",
                format!("'{}' is not a commit hash", hash),
            ));
        }

        Ok(ResolvedLatest::commit(hash))
    }
}
