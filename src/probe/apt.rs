//! APT source probe
//!
//! Resolves the candidate version of a package from the local APT index
//! via `apt-cache policy`, and classifies the candidate as a security fix
//! when it is served from a security archive. This is the only probe that
//! ever sets the security classification.

use crate::command::{argv, CommandRunner};
use crate::domain::SourceDescriptor;
use crate::error::{ConfigError, ProbeError};
use crate::probe::{require_param, ResolvedLatest, SourceProbe};
use async_trait::async_trait;
use std::sync::Arc;

/// Probe for the local APT package index
#[derive(Debug)]
pub struct AptProbe {
    package: String,
    runner: Arc<dyn CommandRunner>,
}

impl AptProbe {
    /// Create a probe for a named package
    pub fn new(package: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            package: package.into(),
            runner,
        }
    }

    /// Build from a descriptor; requires the `package` parameter
    pub fn from_descriptor(
        descriptor: &SourceDescriptor,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ConfigError> {
        let package = require_param(&descriptor.package, "apt", "package")?;
        Ok(Self::new(package, runner))
    }
}

#[async_trait]
impl SourceProbe for AptProbe {
    fn source_name(&self) -> &'static str {
        "apt"
    }

    async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError> {
        let command = argv(&["apt-cache", "policy", &self.package]);
        let output = self.runner.run(&command).map_err(|e| {
            ProbeError::network(&self.package, "apt", format!("failed to run apt-cache: {}", e))
        })?;

        if !output.success() {
            return Err(ProbeError::network(
                &self.package,
                "apt",
                format!("apt-cache exited with status {}", output.exit_code),
            ));
        }

        parse_policy(&output.stdout, &self.package)
    }
}

/// Parse `apt-cache policy` output into candidate version plus security
/// classification.
///
/// Empty output means the package is not indexed. A candidate of
/// "(none)" means the index knows the name but offers no installable
/// version; both are NotFound. Non-empty output without a Candidate line
/// is a malformed index entry.
fn parse_policy(stdout: &str, package: &str) -> Result<ResolvedLatest, ProbeError> {
    if stdout.trim().is_empty() {
        return Err(ProbeError::not_found(package, "apt"));
    }

    let candidate = stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Candidate:"))
        .map(str::trim)
        .ok_or_else(|| ProbeError::parse(package, "apt", "missing Candidate line"))?;

    if candidate.is_empty() {
        return Err(ProbeError::parse(package, "apt", "empty Candidate line"));
    }
    if candidate == "(none)" {
        return Err(ProbeError::not_found(package, "apt"));
    }

    let security_fix = candidate_from_security_archive(stdout, candidate);
    Ok(ResolvedLatest::version(candidate).with_security_fix(security_fix))
}

/// Walk the version table and report whether the candidate's block lists
/// a security archive. Version-block headers carry "VERSION PRIORITY";
/// source lines below them carry "PRIORITY URL-or-path".
fn candidate_from_security_archive(stdout: &str, candidate: &str) -> bool {
    let mut in_table = false;
    let mut in_candidate_block = false;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("Version table:") {
            in_table = true;
            continue;
        }
        if !in_table || trimmed.is_empty() {
            continue;
        }

        let body = trimmed.strip_prefix("***").map(str::trim_start).unwrap_or(trimmed);
        let mut tokens = body.split_whitespace();
        let first = tokens.next().unwrap_or("");
        let second = tokens.next().unwrap_or("");

        let is_source_line =
            first.contains("://") || second.contains("://") || second.starts_with('/');

        if is_source_line {
            if in_candidate_block
                && (trimmed.contains("-security") || trimmed.contains("security."))
            {
                return true;
            }
        } else {
            in_candidate_block = first == candidate;
        }
    }

    false
}
