//! Update action invocation
//!
//! The core treats update actions as opaque: an argv from the target
//! descriptor, run synchronously through the command capability. What
//! the command does (apt-get, a tarball unpack, make install) is the
//! descriptor author's business.

use crate::command::CommandRunner;
use crate::domain::{ActionOutcome, Decision, Target};
use std::sync::Arc;

/// Maximum stderr characters carried into the outcome message
const STDERR_TAIL: usize = 400;

/// Invokes a target's update action
pub trait UpdateAction: Send + Sync {
    /// Run the action for a target given its decision
    fn invoke(&self, target: &Target, decision: &Decision) -> ActionOutcome;
}

/// UpdateAction that executes the descriptor's argv
pub struct CommandUpdateAction {
    runner: Arc<dyn CommandRunner>,
}

impl CommandUpdateAction {
    /// Create an action runner over the command capability
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl UpdateAction for CommandUpdateAction {
    fn invoke(&self, target: &Target, decision: &Decision) -> ActionOutcome {
        match self.runner.run(&target.action.command) {
            Ok(output) if output.success() => {
                let to_version = decision
                    .latest
                    .as_deref()
                    .unwrap_or("latest");
                ActionOutcome::succeeded(format!("updated to {}", to_version))
            }
            Ok(output) => {
                let mut detail = output.stderr.trim().to_string();
                if detail.is_empty() {
                    detail = output.stdout.trim().to_string();
                }
                let chars = detail.chars().count();
                if chars > STDERR_TAIL {
                    detail = detail.chars().skip(chars - STDERR_TAIL).collect();
                }
                ActionOutcome::failed(format!(
                    "exited with status {}: {}",
                    output.exit_code, detail
                ))
            }
            Err(e) => ActionOutcome::failed(format!("failed to launch: {}", e)),
        }
    }
}
