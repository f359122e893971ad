//! Installed-version detection from declarative rules
//!
//! A detection rule says how to read the currently installed version of a
//! target: parse a command's output, query a system package manager, or
//! inspect a file. "Not installed" is a normal, expected outcome — any
//! execution failure (missing command, non-zero exit, unmatched pattern,
//! unreadable file) yields [`Installed::Absent`] rather than an error.

use crate::command::{argv, CommandRunner};
use crate::version::Version;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Declarative rule for reading the installed version of a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DetectionRule {
    /// Run a command and extract the version with a regex. Capture group 1
    /// is the version when present, otherwise the whole match.
    CommandOutputRegex { command: Vec<String>, pattern: String },

    /// Ask a system package manager for the installed version of a package
    PackageQuery { manager: String, package: String },

    /// Read a file; with a pattern, extract as for CommandOutputRegex,
    /// without one the trimmed file content is the version
    FileRead {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
}

impl DetectionRule {
    /// Validate the rule shape at registry load time, so runtime Absent
    /// only ever means "not installed", not "bad descriptor"
    pub fn validate(&self) -> Result<(), String> {
        match self {
            DetectionRule::CommandOutputRegex { command, pattern } => {
                if command.is_empty() {
                    return Err("detection command is empty".to_string());
                }
                Regex::new(pattern).map_err(|e| format!("invalid detection pattern: {}", e))?;
                Ok(())
            }
            DetectionRule::PackageQuery { manager, package } => {
                if package.is_empty() {
                    return Err("detection package is empty".to_string());
                }
                query_argv(manager, package)
                    .map(|_| ())
                    .ok_or_else(|| format!("unsupported package manager '{}'", manager))
            }
            DetectionRule::FileRead { pattern, .. } => {
                if let Some(p) = pattern {
                    Regex::new(p).map_err(|e| format!("invalid detection pattern: {}", e))?;
                }
                Ok(())
            }
        }
    }
}

/// Outcome of running a detection rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installed {
    /// The target is installed at this version
    Version(Version),
    /// The target is not installed (or could not be observed, which the
    /// rule contract treats the same way)
    Absent,
}

impl Installed {
    /// Returns the version when installed
    pub fn version(&self) -> Option<&Version> {
        match self {
            Installed::Version(v) => Some(v),
            Installed::Absent => None,
        }
    }
}

/// Runs detection rules through the command capability
pub struct InstalledVersionDetector {
    runner: Arc<dyn CommandRunner>,
}

impl InstalledVersionDetector {
    /// Create a detector over the given command runner
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run a rule. Infallible by contract: failures are Absent.
    pub fn detect(&self, rule: &DetectionRule) -> Installed {
        match rule {
            DetectionRule::CommandOutputRegex { command, pattern } => {
                self.from_command(command, pattern)
            }
            DetectionRule::PackageQuery { manager, package } => self.from_query(manager, package),
            DetectionRule::FileRead { path, pattern } => from_file(path, pattern.as_deref()),
        }
    }

    fn from_command(&self, command: &[String], pattern: &str) -> Installed {
        let Ok(output) = self.runner.run(command) else {
            return Installed::Absent;
        };
        if !output.success() {
            return Installed::Absent;
        }
        extract(&output.stdout, pattern)
    }

    fn from_query(&self, manager: &str, package: &str) -> Installed {
        let Some(command) = query_argv(manager, package) else {
            return Installed::Absent;
        };
        let Ok(output) = self.runner.run(&command) else {
            return Installed::Absent;
        };
        if !output.success() {
            return Installed::Absent;
        }
        match parse_query_output(manager, package, &output.stdout) {
            Some(version) if !version.is_empty() => Installed::Version(Version::parse(&version)),
            _ => Installed::Absent,
        }
    }
}

/// Query argv per manager; None for managers this crate does not know
fn query_argv(manager: &str, package: &str) -> Option<Vec<String>> {
    let command = match manager {
        "dpkg" => argv(&["dpkg-query", "-W", "-f=${Version}", package]),
        "pacman" => argv(&["pacman", "-Q", package]),
        "npm" => argv(&["npm", "ls", "-g", "--depth=0", package]),
        "pip" => argv(&["pip", "show", package]),
        _ => return None,
    };
    Some(command)
}

fn parse_query_output(manager: &str, package: &str, stdout: &str) -> Option<String> {
    match manager {
        // dpkg-query prints the bare version via the format string
        "dpkg" => Some(stdout.trim().to_string()),
        // "vim 9.0.1-1" -> second token
        "pacman" => stdout
            .split_whitespace()
            .nth(1)
            .map(|s| s.to_string()),
        // a line containing "package@1.2.3"
        "npm" => {
            let needle = format!("{}@", package);
            stdout.lines().find_map(|line| {
                let at = line.find(&needle)?;
                let rest = &line[at + needle.len()..];
                let end = rest
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(rest.len());
                Some(rest[..end].to_string())
            })
        }
        // "Version: 1.2.3" line
        "pip" => stdout.lines().find_map(|line| {
            line.strip_prefix("Version:")
                .map(|rest| rest.trim().to_string())
        }),
        _ => None,
    }
}

fn from_file(path: &PathBuf, pattern: Option<&str>) -> Installed {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Installed::Absent;
    };
    match pattern {
        Some(p) => extract(&content, p),
        None => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                Installed::Absent
            } else {
                Installed::Version(Version::parse(trimmed))
            }
        }
    }
}

fn extract(haystack: &str, pattern: &str) -> Installed {
    // invalid patterns are rejected at load; treat one here as no match
    let Ok(re) = Regex::new(pattern) else {
        return Installed::Absent;
    };
    let Some(captures) = re.captures(haystack) else {
        return Installed::Absent;
    };
    let matched = captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    if matched.is_empty() {
        Installed::Absent
    } else {
        Installed::Version(Version::parse(matched))
    }
}
