//! Orchestrator: the sequential run loop
//!
//! Iterates loaded targets in registry order, asks the engine for a
//! decision, applies the confirmation policy, and invokes update actions
//! with failure isolation: one target's failed action never stops the
//! targets after it. Targets are processed one at a time on purpose —
//! update actions mutate shared system state (package databases, the
//! filesystem) that tolerates no concurrency without a transaction
//! manager this tool does not have.
//!
//! An interrupt is honored between targets, never mid-subprocess: once
//! the flag is set, no new decision or action starts and the remaining
//! targets are reported as cancelled, letting any already-started action
//! finish or fail naturally.

use crate::action::UpdateAction;
use crate::command::{argv, CommandRunner};
use crate::context::{ConfirmPolicy, Confirmer, RunContext};
use crate::detect::Installed;
use crate::domain::{ActionDisposition, RunReport, Target, TargetReport};
use crate::engine::UpdateDecisionEngine;
use crate::error::FatalError;
use crate::progress::Progress;
use crate::targets::{LoadWarning, TargetFilter};
use std::cmp::Ordering;
use std::sync::Arc;

/// Drives one run over the loaded targets
pub struct Orchestrator {
    engine: UpdateDecisionEngine,
    action: Box<dyn UpdateAction>,
    confirmer: Box<dyn Confirmer>,
    runner: Arc<dyn CommandRunner>,
    filter: TargetFilter,
    ctx: RunContext,
}

impl Orchestrator {
    /// Wire up an orchestrator
    pub fn new(
        engine: UpdateDecisionEngine,
        action: Box<dyn UpdateAction>,
        confirmer: Box<dyn Confirmer>,
        runner: Arc<dyn CommandRunner>,
        filter: TargetFilter,
        ctx: RunContext,
    ) -> Self {
        Self {
            engine,
            action,
            confirmer,
            runner,
            filter,
            ctx,
        }
    }

    /// Process every target in order and produce the run report.
    ///
    /// Fails only on fatal pre-flight conditions; per-target problems are
    /// recorded in the report.
    pub async fn run(
        &self,
        targets: &[Target],
        warnings: &[LoadWarning],
    ) -> Result<RunReport, FatalError> {
        self.privilege_preflight(targets)?;
        self.dependency_preflight(targets)?;

        let mut report = RunReport::new(self.ctx.is_dry_run());
        report.warnings = warnings.iter().map(|w| w.to_string()).collect();

        let selected: Vec<&Target> = targets
            .iter()
            .filter(|t| self.filter.allows(&t.id))
            .collect();

        let mut progress = Progress::new(!self.ctx.quiet);
        progress.start(selected.len() as u64);

        for target in selected {
            if self.ctx.is_interrupted() {
                report.interrupted = true;
                report.push(TargetReport {
                    id: target.id.clone(),
                    display_name: target.display_name.clone(),
                    decision: None,
                    action: ActionDisposition::Cancelled,
                    verified: None,
                });
                progress.target_done();
                continue;
            }

            if !target.enabled {
                report.push(TargetReport {
                    id: target.id.clone(),
                    display_name: target.display_name.clone(),
                    decision: None,
                    action: ActionDisposition::Disabled,
                    verified: None,
                });
                progress.target_done();
                continue;
            }

            progress.checking(&target.display_name);
            let decision = self.engine.decide(target).await;

            let mut verified = None;
            let action = if decision.wants_action() {
                match self.ctx.policy {
                    ConfirmPolicy::DryRun => ActionDisposition::DryRun,
                    ConfirmPolicy::AlwaysYes => {
                        progress.updating(&target.display_name);
                        let outcome = self.action.invoke(target, &decision);
                        if outcome.success && target.verify_after {
                            verified = Some(self.verify(target, &decision));
                        }
                        ActionDisposition::Invoked(outcome)
                    }
                    ConfirmPolicy::AlwaysPrompt => {
                        let prompt =
                            format!("update {} ({})?", target.display_name, decision);
                        if progress.suspend(|| self.confirmer.confirm(&prompt)) {
                            progress.updating(&target.display_name);
                            let outcome = self.action.invoke(target, &decision);
                            if outcome.success && target.verify_after {
                                verified = Some(self.verify(target, &decision));
                            }
                            ActionDisposition::Invoked(outcome)
                        } else {
                            ActionDisposition::Declined
                        }
                    }
                }
            } else {
                ActionDisposition::NotNeeded
            };

            report.push(TargetReport {
                id: target.id.clone(),
                display_name: target.display_name.clone(),
                decision: Some(decision),
                action,
                verified,
            });
            progress.target_done();
        }

        progress.finish();
        report.finish();
        Ok(report)
    }

    /// Re-detect after a successful action: does the target now report at
    /// least the version the action installed?
    fn verify(&self, target: &Target, decision: &crate::domain::Decision) -> bool {
        let installed = match self.engine.detector().detect(&target.detection) {
            Installed::Version(v) => v,
            Installed::Absent => return false,
        };
        match &decision.latest {
            Some(latest) => {
                crate::version::compare(installed.raw(), latest) != Ordering::Less
            }
            None => true,
        }
    }

    /// Abort before any processing when a root-requiring action would run
    /// without privilege. Dry runs never execute actions, so they pass.
    fn privilege_preflight(&self, targets: &[Target]) -> Result<(), FatalError> {
        if self.ctx.is_dry_run() {
            return Ok(());
        }
        let needs_root: Vec<&str> = targets
            .iter()
            .filter(|t| t.enabled && t.requires_root && self.filter.allows(&t.id))
            .map(|t| t.id.as_str())
            .collect();
        if needs_root.is_empty() {
            return Ok(());
        }

        match self.effective_uid() {
            Some(0) => Ok(()),
            Some(_) => Err(FatalError::InsufficientPrivilege {
                detail: format!("targets require root: {}", needs_root.join(", ")),
            }),
            // cannot tell; let the actions themselves fail if they must
            None => Ok(()),
        }
    }

    fn effective_uid(&self) -> Option<u32> {
        let output = self.runner.run(&argv(&["id", "-u"])).ok()?;
        if !output.success() {
            return None;
        }
        output.stdout.trim().parse().ok()
    }

    /// Abort when a tool the selected targets cannot be processed without
    /// is absent. Probes run even in dry-run mode, so this applies there
    /// too.
    fn dependency_preflight(&self, targets: &[Target]) -> Result<(), FatalError> {
        let needs_git = targets
            .iter()
            .any(|t| t.enabled && t.source.kind == "git-commit" && self.filter.allows(&t.id));
        if needs_git && self.runner.run(&argv(&["git", "--version"])).is_err() {
            return Err(FatalError::MissingDependency {
                name: "git".to_string(),
            });
        }
        Ok(())
    }
}
