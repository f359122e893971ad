//! Run report structures consumed by the output layer

use super::{Decision, DecisionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of invoking one update action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether the action reported success
    pub success: bool,
    /// Human-readable outcome detail (stderr tail on failure)
    pub message: String,
}

impl ActionOutcome {
    /// Creates a successful outcome
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates a failed outcome
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// What happened to a target's update action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum ActionDisposition {
    /// Decision did not call for an action
    NotNeeded,
    /// Target is disabled; nothing was probed or run
    Disabled,
    /// Dry-run policy: action reported but not run
    DryRun,
    /// Interactive confirmation was declined
    Declined,
    /// Interrupt received before this target started
    Cancelled,
    /// The action was invoked
    Invoked(ActionOutcome),
}

impl ActionDisposition {
    /// True when an action was invoked and failed
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionDisposition::Invoked(outcome) if !outcome.success)
    }
}

impl fmt::Display for ActionDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionDisposition::NotNeeded => write!(f, "no action needed"),
            ActionDisposition::Disabled => write!(f, "disabled"),
            ActionDisposition::DryRun => write!(f, "dry run"),
            ActionDisposition::Declined => write!(f, "declined"),
            ActionDisposition::Cancelled => write!(f, "cancelled"),
            ActionDisposition::Invoked(outcome) if outcome.success => write!(f, "updated"),
            ActionDisposition::Invoked(outcome) => write!(f, "failed: {}", outcome.message),
        }
    }
}

/// Per-target record in the run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    /// Target id
    pub id: String,
    /// Human label
    pub display_name: String,
    /// Engine decision; None when the target was disabled or cancelled
    /// before a decision was computed
    pub decision: Option<Decision>,
    /// What happened to the update action
    pub action: ActionDisposition,
    /// Post-action re-detection result, when the target asked for it:
    /// true if the target then reported up to date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

/// Ordered outcome of one run, plus registry warnings and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-target records in processing order
    pub targets: Vec<TargetReport>,
    /// Warnings recorded while loading target descriptors
    pub warnings: Vec<String>,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Whether an interrupt cut the run short
    pub interrupted: bool,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Run end time
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Creates an empty report started now
    pub fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            targets: Vec::new(),
            warnings: Vec::new(),
            dry_run,
            interrupted: false,
            started_at: now,
            finished_at: now,
        }
    }

    /// Append a target record
    pub fn push(&mut self, record: TargetReport) {
        self.targets.push(record);
    }

    /// Stamp the end time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Number of targets with updates available (security included)
    pub fn updates_available(&self) -> usize {
        self.count_status(DecisionStatus::UpdateAvailable)
            + self.count_status(DecisionStatus::SecurityUpdateAvailable)
    }

    /// Number of targets whose probe failed
    pub fn probe_failures(&self) -> usize {
        self.count_status(DecisionStatus::ProbeFailed)
    }

    /// Number of actions that were invoked and failed
    pub fn actions_failed(&self) -> usize {
        self.targets.iter().filter(|t| t.action.is_failure()).count()
    }

    /// Number of actions that were invoked and succeeded
    pub fn actions_succeeded(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| matches!(&t.action, ActionDisposition::Invoked(o) if o.success))
            .count()
    }

    fn count_status(&self, status: DecisionStatus) -> usize {
        self.targets
            .iter()
            .filter(|t| t.decision.as_ref().is_some_and(|d| d.status == status))
            .count()
    }

    /// Process exit code for this run.
    ///
    /// 0 success, 1 user cancel, 3 network failure, 4 package-manager
    /// error. Precedence: a cancel outranks everything, action failures
    /// outrank probe failures, and among probe failures transport
    /// problems (network, rate limit) map to 3 while source-side
    /// problems (parse, not-found) map to 4.
    pub fn exit_code(&self) -> u8 {
        if self.interrupted {
            return 1;
        }
        if self.actions_failed() > 0 {
            return 4;
        }

        let mut saw_source_failure = false;
        for target in &self.targets {
            let Some(decision) = &target.decision else {
                continue;
            };
            if let Some(failure) = &decision.failure {
                match failure.kind.as_str() {
                    "network" | "rate-limited" => return 3,
                    _ => saw_source_failure = true,
                }
            }
        }
        if saw_source_failure {
            return 4;
        }
        0
    }
}
