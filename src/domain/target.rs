//! Target definitions loaded from declarative descriptors

use crate::detect::DetectionRule;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Which upstream to query and how, selected by kind through the probe
/// registry. Parameters are a flat optional set; each probe constructor
/// validates the ones its kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Probe kind key, e.g. "apt", "github-release", "npm", "git-commit",
    /// "package-manager"
    pub kind: String,

    /// Package name (apt, npm, package-manager)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Repository owner (github-release)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Repository name (github-release)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Tag prefix to strip before comparison, defaults to "v"
    /// (github-release)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_prefix: Option<String>,

    /// Consider prerelease tags as candidates (github-release)
    #[serde(default)]
    pub include_prerelease: bool,

    /// Remote repository URL (git-commit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Branch to resolve, defaults to the remote HEAD branch (git-commit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// System package manager name (package-manager, bulk pending check)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
}

impl SourceDescriptor {
    /// Descriptor with only a kind set, for building up in tests and code
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            package: None,
            owner: None,
            repo: None,
            tag_prefix: None,
            include_prerelease: false,
            url: None,
            branch: None,
            manager: None,
        }
    }
}

/// The update action to run when the engine reports an available update.
/// Opaque to the core: an argv executed through the command capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Command and arguments, e.g. ["apt-get", "install", "-y", "vim"]
    pub command: Vec<String>,
}

/// One unit of update management.
///
/// Constructed once at registry load time from its descriptor file and
/// immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Stable identifier, unique within a run
    pub id: String,

    /// Human label for reports
    pub display_name: String,

    /// Disabled targets are loaded but never probed or updated
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Escalate to SECURITY_UPDATE_AVAILABLE when the source classifies
    /// the candidate as a security fix (APT-only classification)
    #[serde(default)]
    pub security_sensitive: bool,

    /// Marks the bulk OS package-set target eligible for the lightweight
    /// pending-updates short-circuit
    #[serde(default)]
    pub bulk: bool,

    /// The update action must run as root
    #[serde(default)]
    pub requires_root: bool,

    /// Re-run detection after a successful action and record whether the
    /// target then reports up to date
    #[serde(default)]
    pub verify_after: bool,

    /// How to read the installed version
    pub detection: DetectionRule,

    /// Which upstream to query for the latest version
    pub source: SourceDescriptor,

    /// What to run when an update is available
    pub action: ActionSpec,
}

impl Target {
    /// Probe error subject for this target: the queried package where one
    /// is named, otherwise the target id
    pub fn probe_subject(&self) -> &str {
        self.source.package.as_deref().unwrap_or(&self.id)
    }
}
