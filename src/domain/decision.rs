//! Decision results produced by the update engine

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The engine's per-target verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Installed version is at least the latest available
    UpToDate,
    /// A newer version is available upstream
    UpdateAvailable,
    /// A newer version is available and the source classified it as a
    /// security fix
    SecurityUpdateAvailable,
    /// The target is not installed
    Absent,
    /// The upstream query failed; no verdict on freshness
    ProbeFailed,
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecisionStatus::UpToDate => "up to date",
            DecisionStatus::UpdateAvailable => "update available",
            DecisionStatus::SecurityUpdateAvailable => "security update available",
            DecisionStatus::Absent => "not installed",
            DecisionStatus::ProbeFailed => "probe failed",
        };
        write!(f, "{}", label)
    }
}

/// Output of the engine for one target. Transient: created by the engine,
/// consumed by the orchestrator, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The verdict
    pub status: DecisionStatus,
    /// Installed version string, when detected
    pub installed: Option<String>,
    /// Latest version or commit hash, when the probe resolved one
    pub latest: Option<String>,
    /// The probe failure, when status is ProbeFailed
    pub failure: Option<ProbeFailure>,
}

/// Serializable snapshot of a ProbeError for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    /// Error kind tag: network, parse, not-found, rate-limited
    pub kind: String,
    /// Source the failure came from
    pub source: String,
    /// Full error message
    pub message: String,
}

impl From<&ProbeError> for ProbeFailure {
    fn from(err: &ProbeError) -> Self {
        Self {
            kind: err.kind().to_string(),
            source: err.source_name().to_string(),
            message: err.to_string(),
        }
    }
}

impl Decision {
    /// Creates an UP_TO_DATE decision
    pub fn up_to_date(installed: Option<String>, latest: Option<String>) -> Self {
        Self {
            status: DecisionStatus::UpToDate,
            installed,
            latest,
            failure: None,
        }
    }

    /// Creates an UPDATE_AVAILABLE decision
    pub fn update_available(installed: impl Into<String>, latest: impl Into<String>) -> Self {
        Self {
            status: DecisionStatus::UpdateAvailable,
            installed: Some(installed.into()),
            latest: Some(latest.into()),
            failure: None,
        }
    }

    /// Creates a SECURITY_UPDATE_AVAILABLE decision
    pub fn security_update_available(
        installed: impl Into<String>,
        latest: impl Into<String>,
    ) -> Self {
        Self {
            status: DecisionStatus::SecurityUpdateAvailable,
            installed: Some(installed.into()),
            latest: Some(latest.into()),
            failure: None,
        }
    }

    /// Creates an ABSENT decision
    pub fn absent() -> Self {
        Self {
            status: DecisionStatus::Absent,
            installed: None,
            latest: None,
            failure: None,
        }
    }

    /// Creates a PROBE_FAILED decision carrying the installed version
    /// that was detected before the probe failed
    pub fn probe_failed(installed: Option<String>, error: &ProbeError) -> Self {
        Self {
            status: DecisionStatus::ProbeFailed,
            installed,
            latest: None,
            failure: Some(ProbeFailure::from(error)),
        }
    }

    /// True when the orchestrator should consider running the update action
    pub fn wants_action(&self) -> bool {
        matches!(
            self.status,
            DecisionStatus::UpdateAvailable | DecisionStatus::SecurityUpdateAvailable
        )
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.installed, &self.latest) {
            (Some(i), Some(l)) if self.wants_action() => {
                write!(f, "{} ({} → {})", self.status, i, l)
            }
            (Some(i), _) => write!(f, "{} ({})", self.status, i),
            _ => write!(f, "{}", self.status),
        }
    }
}
