//! Run context and confirmation policy
//!
//! All run-wide knobs travel in an explicit [`RunContext`] value passed
//! into the components that need them; nothing reads ambient process
//! state. The interrupt flag is the one shared-mutable piece: set by the
//! signal handler, read between targets.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default probe timeout in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// How the orchestrator decides whether to run an update action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPolicy {
    /// Run every action without asking
    AlwaysYes,
    /// Ask before each action through the Confirmer
    AlwaysPrompt,
    /// Never run actions; report what would happen
    DryRun,
}

/// Interactive confirmation seam, injectable for tests
pub trait Confirmer: Send + Sync {
    /// Ask the user; true means proceed
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmer reading y/n answers from standard input
#[derive(Debug, Default)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Run-wide configuration passed into components
#[derive(Clone)]
pub struct RunContext {
    /// Confirmation policy from the CLI layer
    pub policy: ConfirmPolicy,
    /// Per-probe timeout
    pub probe_timeout: Duration,
    /// Colored output enabled
    pub color: bool,
    /// Quiet reporting (suppresses progress)
    pub quiet: bool,
    /// Set when an interrupt was received; checked between targets
    interrupted: Arc<AtomicBool>,
}

impl RunContext {
    /// Context with the given policy and defaults for everything else
    pub fn new(policy: ConfirmPolicy) -> Self {
        Self {
            policy,
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            color: true,
            quiet: false,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// The shared interrupt flag, for wiring to a signal handler
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Whether an interrupt has been received
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// True when this run never executes actions
    pub fn is_dry_run(&self) -> bool {
        self.policy == ConfirmPolicy::DryRun
    }
}
