//! Target registry: discovery and loading of declarative descriptors
//!
//! Targets are defined as one TOML file each in a targets directory. A
//! malformed descriptor is skipped with a recorded warning so one bad
//! file never prevents the others from loading. Files are processed in
//! file-name order, which keeps report ordering stable across runs and
//! machines.

use crate::domain::Target;
use crate::error::{ConfigError, FatalError};
use crate::probe::ProbeRegistry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A descriptor that could not be loaded, with its reason
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Descriptor file the warning is about
    pub path: PathBuf,
    /// Why it was skipped
    pub message: String,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped {}: {}", self.path.display(), self.message)
    }
}

/// Result of loading a targets directory
#[derive(Debug)]
pub struct LoadedTargets {
    /// Successfully loaded targets, in file-name order
    pub targets: Vec<Target>,
    /// One warning per skipped descriptor
    pub warnings: Vec<LoadWarning>,
}

/// Filter applied to loaded targets from the CLI layer
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    /// Process only these ids (empty means all)
    pub only: Vec<String>,
    /// Skip these ids
    pub exclude: Vec<String>,
}

impl TargetFilter {
    /// Create a filter from CLI lists
    pub fn new(only: Vec<String>, exclude: Vec<String>) -> Self {
        Self { only, exclude }
    }

    /// Whether a target id passes the filter
    pub fn allows(&self, id: &str) -> bool {
        if !self.only.is_empty() {
            return self.only.iter().any(|t| t == id);
        }
        !self.exclude.iter().any(|t| t == id)
    }
}

/// Load every `*.toml` descriptor under `dir`.
///
/// A missing directory is fatal; anything wrong with an individual
/// descriptor is a warning.
pub fn load_all(dir: &Path, probes: &ProbeRegistry) -> Result<LoadedTargets, FatalError> {
    if !dir.is_dir() {
        return Err(FatalError::TargetsDirMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|_| FatalError::TargetsDirMissing {
            path: dir.to_path_buf(),
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut targets = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for path in paths {
        match load_one(&path, probes) {
            Ok(target) => {
                if !seen_ids.insert(target.id.clone()) {
                    warnings.push(LoadWarning {
                        path,
                        message: format!("duplicate target id '{}'", target.id),
                    });
                    continue;
                }
                targets.push(target);
            }
            Err(e) => warnings.push(LoadWarning {
                path,
                message: e.to_string(),
            }),
        }
    }

    Ok(LoadedTargets { targets, warnings })
}

fn load_one(path: &Path, probes: &ProbeRegistry) -> Result<Target, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::read_error(path, e))?;

    let target: Target =
        toml::from_str(&content).map_err(|e| ConfigError::parse_error(path, e.to_string()))?;

    validate(&target, probes)?;
    Ok(target)
}

/// Shape checks beyond what serde enforces, so runtime failures can only
/// mean what their contracts say they mean
fn validate(target: &Target, probes: &ProbeRegistry) -> Result<(), ConfigError> {
    if target.id.trim().is_empty() {
        return Err(ConfigError::invalid("target id is empty"));
    }
    if target.action.command.is_empty() {
        return Err(ConfigError::invalid("update action command is empty"));
    }
    target
        .detection
        .validate()
        .map_err(ConfigError::invalid)?;

    // constructing the probe validates kind and parameters; the instance
    // is discarded, the engine builds its own at decision time
    probes.build(&target.source).map(|_| ())
}
