//! Generic package-manager probe
//!
//! Fallback for targets tracked by a system package manager this crate
//! has no dedicated probe for: shells out to the manager's own
//! "show candidate version" operation. Supported managers: apt, pacman.
//! Unlike [`super::AptProbe`] this probe never classifies security fixes.

use crate::command::{argv, CommandRunner};
use crate::domain::SourceDescriptor;
use crate::error::{ConfigError, ProbeError};
use crate::probe::{require_param, ResolvedLatest, SourceProbe};
use async_trait::async_trait;
use std::sync::Arc;

/// Probe delegating to a system package manager's candidate query
#[derive(Debug)]
pub struct PackageManagerProbe {
    manager: String,
    package: String,
    runner: Arc<dyn CommandRunner>,
}

impl PackageManagerProbe {
    /// Create a probe for a manager/package pair. Unknown managers are
    /// rejected here so a bad descriptor surfaces at load time.
    pub fn new(
        manager: impl Into<String>,
        package: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ConfigError> {
        let manager = manager.into();
        if !matches!(manager.as_str(), "apt" | "pacman") {
            return Err(ConfigError::invalid(format!(
                "package-manager source does not support manager '{}'",
                manager
            )));
        }
        Ok(Self {
            manager,
            package: package.into(),
            runner,
        })
    }

    /// Build from a descriptor; requires `manager` and `package`
    pub fn from_descriptor(
        descriptor: &SourceDescriptor,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ConfigError> {
        let manager = require_param(&descriptor.manager, "package-manager", "manager")?;
        let package = require_param(&descriptor.package, "package-manager", "package")?;
        Self::new(manager, package, runner)
    }

    fn command(&self) -> Vec<String> {
        match self.manager.as_str() {
            "apt" => argv(&["apt-cache", "policy", &self.package]),
            "pacman" => argv(&["pacman", "-Si", &self.package]),
            _ => unreachable!("manager validated in constructor"),
        }
    }

    fn parse(&self, stdout: &str) -> Result<String, ProbeError> {
        match self.manager.as_str() {
            "apt" => parse_apt_candidate(stdout, &self.package),
            "pacman" => parse_pacman_version(stdout, &self.package),
            _ => unreachable!("manager validated in constructor"),
        }
    }
}

#[async_trait]
impl SourceProbe for PackageManagerProbe {
    fn source_name(&self) -> &'static str {
        "package-manager"
    }

    async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError> {
        let output = self.runner.run(&self.command()).map_err(|e| {
            ProbeError::network(
                &self.package,
                self.source_name(),
                format!("failed to run {}: {}", self.manager, e),
            )
        })?;

        // pacman -Si exits non-zero for unknown packages
        if !output.success() {
            return Err(ProbeError::not_found(&self.package, self.source_name()));
        }

        self.parse(&output.stdout).map(ResolvedLatest::version)
    }
}

fn parse_apt_candidate(stdout: &str, package: &str) -> Result<String, ProbeError> {
    if stdout.trim().is_empty() {
        return Err(ProbeError::not_found(package, "package-manager"));
    }
    let candidate = stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Candidate:"))
        .map(str::trim)
        .ok_or_else(|| ProbeError::parse(package, "package-manager", "missing Candidate line"))?;
    if candidate == "(none)" || candidate.is_empty() {
        return Err(ProbeError::not_found(package, "package-manager"));
    }
    Ok(candidate.to_string())
}

fn parse_pacman_version(stdout: &str, package: &str) -> Result<String, ProbeError> {
    if stdout.trim().is_empty() {
        return Err(ProbeError::not_found(package, "package-manager"));
    }
    stdout
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            (key.trim() == "Version").then(|| value.trim().to_string())
        })
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProbeError::parse(package, "package-manager", "missing Version field"))
}
