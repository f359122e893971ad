//! Update decision engine
//!
//! One decision per target, no state retained across targets:
//!
//! ```text
//! detect installed
//!   Absent -> ABSENT
//!   Version v -> probe latest
//!     failure -> PROBE_FAILED
//!     Version w -> compare(v, w)
//!       >= -> UP_TO_DATE
//!       <  -> SECURITY_UPDATE_AVAILABLE when the target is
//!             security-sensitive and the source classified w as a
//!             security fix, else UPDATE_AVAILABLE
//! ```
//!
//! For the bulk OS package-set target a lightweight pending-updates check
//! runs first and short-circuits to UP_TO_DATE on a verified zero. The
//! check failing to run is never treated as zero: the engine falls back
//! to the full pipeline instead. Commit-hash sources compare by equality
//! only.

use crate::command::{argv, CommandRunner};
use crate::context::RunContext;
use crate::detect::{Installed, InstalledVersionDetector};
use crate::domain::{Decision, Target};
use crate::error::ProbeError;
use crate::probe::ProbeRegistry;
use crate::version::VersionComparator;
use std::cmp::Ordering;
use std::sync::Arc;

/// Default manager for the bulk pending-updates check
const DEFAULT_BULK_MANAGER: &str = "apt";

/// Produces one [`Decision`] per target
pub struct UpdateDecisionEngine {
    detector: InstalledVersionDetector,
    comparator: VersionComparator,
    probes: ProbeRegistry,
    runner: Arc<dyn CommandRunner>,
    ctx: RunContext,
}

impl UpdateDecisionEngine {
    /// Create an engine over the given capabilities
    pub fn new(
        detector: InstalledVersionDetector,
        comparator: VersionComparator,
        probes: ProbeRegistry,
        runner: Arc<dyn CommandRunner>,
        ctx: RunContext,
    ) -> Self {
        Self {
            detector,
            comparator,
            probes,
            runner,
            ctx,
        }
    }

    /// Access to the detector, for post-action re-verification
    pub fn detector(&self) -> &InstalledVersionDetector {
        &self.detector
    }

    /// Compute the decision for one target
    pub async fn decide(&self, target: &Target) -> Decision {
        if target.bulk {
            let manager = target
                .source
                .manager
                .as_deref()
                .unwrap_or(DEFAULT_BULK_MANAGER);
            // a verified zero is the only outcome allowed to skip the
            // full pipeline
            if self.pending_updates(manager) == Some(0) {
                return Decision::up_to_date(None, None);
            }
        }

        let installed = match self.detector.detect(&target.detection) {
            Installed::Absent => return Decision::absent(),
            Installed::Version(v) => v,
        };

        let probe = match self.probes.build(&target.source) {
            Ok(probe) => probe,
            Err(e) => {
                let error =
                    ProbeError::parse(target.probe_subject(), target.source.kind.clone(), e.to_string());
                return Decision::probe_failed(Some(installed.raw().to_string()), &error);
            }
        };

        let resolved =
            tokio::time::timeout(self.ctx.probe_timeout, probe.resolve_latest()).await;
        let latest = match resolved {
            Ok(Ok(latest)) => latest,
            Ok(Err(error)) => {
                return Decision::probe_failed(Some(installed.raw().to_string()), &error)
            }
            Err(_) => {
                let error = ProbeError::network(
                    target.probe_subject(),
                    probe.source_name(),
                    format!("probe timed out after {:?}", self.ctx.probe_timeout),
                );
                return Decision::probe_failed(Some(installed.raw().to_string()), &error);
            }
        };

        if latest.commit {
            return if installed.raw() == latest.value {
                Decision::up_to_date(Some(installed.raw().to_string()), Some(latest.value))
            } else {
                Decision::update_available(installed.raw(), latest.value)
            };
        }

        match self.comparator.compare(installed.raw(), &latest.value) {
            Ordering::Greater | Ordering::Equal => {
                Decision::up_to_date(Some(installed.raw().to_string()), Some(latest.value))
            }
            Ordering::Less => {
                if target.security_sensitive && latest.security_fix {
                    Decision::security_update_available(installed.raw(), latest.value)
                } else {
                    Decision::update_available(installed.raw(), latest.value)
                }
            }
        }
    }

    /// Lightweight "any updates pending" check for the bulk target.
    ///
    /// Returns the pending count, or None when the check could not run or
    /// its output was not trustworthy. None MUST send the caller down the
    /// full pipeline.
    fn pending_updates(&self, manager: &str) -> Option<usize> {
        match manager {
            "apt" => {
                let output = self
                    .runner
                    .run(&argv(&["apt-get", "-s", "-qq", "upgrade"]))
                    .ok()?;
                if !output.success() {
                    return None;
                }
                Some(
                    output
                        .stdout
                        .lines()
                        .filter(|line| line.starts_with("Inst "))
                        .count(),
                )
            }
            "pacman" => {
                // pacman -Qu exits 1 with empty output when nothing is
                // pending, 0 with one line per pending package
                let output = self.runner.run(&argv(&["pacman", "-Qu"])).ok()?;
                match output.exit_code {
                    0 => Some(output.stdout.lines().filter(|l| !l.trim().is_empty()).count()),
                    1 if output.stdout.trim().is_empty() => Some(0),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::FakeRunner;
    use crate::command::CommandOutput;
    use crate::context::ConfirmPolicy;
    use crate::detect::DetectionRule;
    use crate::domain::{ActionSpec, DecisionStatus, SourceDescriptor};
    use crate::probe::{ResolvedLatest, SourceProbe};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Probe returning a fixed outcome, registered under test kinds
    #[derive(Debug)]
    struct StaticProbe(Result<ResolvedLatest, ProbeError>);

    #[async_trait]
    impl SourceProbe for StaticProbe {
        fn source_name(&self) -> &'static str {
            "static"
        }
        async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError> {
            self.0.clone()
        }
    }

    /// Probe that never answers, for timeout coverage
    #[derive(Debug)]
    struct HangingProbe;

    #[async_trait]
    impl SourceProbe for HangingProbe {
        fn source_name(&self) -> &'static str {
            "static"
        }
        async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError> {
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        }
    }

    fn test_registry() -> ProbeRegistry {
        let mut registry = ProbeRegistry::empty();
        registry.register("static-version", |d| {
            // the fixture smuggles the version through the package param
            let value = d.package.clone().unwrap_or_default();
            Ok(Box::new(StaticProbe(Ok(ResolvedLatest::version(value)))) as _)
        });
        registry.register("static-security", |d| {
            let value = d.package.clone().unwrap_or_default();
            Ok(Box::new(StaticProbe(Ok(
                ResolvedLatest::version(value).with_security_fix(true)
            ))) as _)
        });
        registry.register("static-commit", |d| {
            let value = d.package.clone().unwrap_or_default();
            Ok(Box::new(StaticProbe(Ok(ResolvedLatest::commit(value)))) as _)
        });
        registry.register("static-network-error", |_| {
            Ok(Box::new(StaticProbe(Err(ProbeError::network(
                "pkg", "static", "connection refused",
            )))) as _)
        });
        registry.register("static-hang", |_| Ok(Box::new(HangingProbe) as _));
        registry
    }

    fn engine_with(runner: FakeRunner) -> UpdateDecisionEngine {
        let runner: Arc<dyn CommandRunner> = Arc::new(runner);
        UpdateDecisionEngine::new(
            InstalledVersionDetector::new(runner.clone()),
            VersionComparator::new(),
            test_registry(),
            runner,
            RunContext::new(ConfirmPolicy::AlwaysYes)
                .with_probe_timeout(Duration::from_millis(200)),
        )
    }

    fn target(installed_cmd_version: &str, source_kind: &str, latest: &str) -> Target {
        let mut source = SourceDescriptor::of_kind(source_kind);
        source.package = Some(latest.to_string());
        Target {
            id: "tool".to_string(),
            display_name: "Tool".to_string(),
            enabled: true,
            security_sensitive: false,
            bulk: false,
            requires_root: false,
            verify_after: false,
            detection: DetectionRule::CommandOutputRegex {
                command: argv(&["tool", "--version"]),
                pattern: format!("({})", regex::escape(installed_cmd_version)),
            },
            source,
            action: ActionSpec {
                command: argv(&["true"]),
            },
        }
    }

    fn runner_with_tool(version: &str) -> FakeRunner {
        FakeRunner::new().script("tool --version", CommandOutput::ok(format!("tool {}\n", version)))
    }

    #[tokio::test]
    async fn test_absent_regardless_of_probe() {
        // detection command is not scripted -> Absent; the probe kind is
        // not even registered, proving the probe is never consulted
        let mut t = target("1.0.0", "no-such-kind", "9.9.9");
        t.source.kind = "no-such-kind".to_string();
        let engine = engine_with(FakeRunner::new());
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::Absent);
        assert!(decision.installed.is_none());
    }

    #[tokio::test]
    async fn test_probe_failure_yields_probe_failed() {
        let t = target("1.0.0", "static-network-error", "");
        let engine = engine_with(runner_with_tool("1.0.0"));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::ProbeFailed);
        assert_eq!(decision.installed.as_deref(), Some("1.0.0"));
        assert_eq!(decision.failure.unwrap().kind, "network");
    }

    #[tokio::test]
    async fn test_newer_upstream_yields_update_available() {
        let t = target("1.0.0", "static-version", "1.2.0");
        let engine = engine_with(runner_with_tool("1.0.0"));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);
        assert_eq!(decision.installed.as_deref(), Some("1.0.0"));
        assert_eq!(decision.latest.as_deref(), Some("1.2.0"));
    }

    #[tokio::test]
    async fn test_equal_versions_yield_up_to_date() {
        let t = target("1.0.0", "static-version", "1.0.0");
        let engine = engine_with(runner_with_tool("1.0.0"));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpToDate);
    }

    #[tokio::test]
    async fn test_newer_installed_yields_up_to_date() {
        // never downgrade
        let t = target("2.1.0", "static-version", "2.0.0");
        let engine = engine_with(runner_with_tool("2.1.0"));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpToDate);
    }

    #[tokio::test]
    async fn test_security_escalation_requires_sensitivity() {
        let mut t = target("1.0.0", "static-security", "1.0.1");
        let engine = engine_with(runner_with_tool("1.0.0"));

        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);

        t.security_sensitive = true;
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::SecurityUpdateAvailable);
    }

    #[tokio::test]
    async fn test_security_sensitive_without_classification() {
        let mut t = target("1.0.0", "static-version", "1.0.1");
        t.security_sensitive = true;
        let engine = engine_with(runner_with_tool("1.0.0"));
        let decision = engine.decide(&t).await;
        // sensitive target, but the source did not classify the fix
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);
    }

    #[tokio::test]
    async fn test_commit_source_compares_by_equality() {
        let hash = "8d5e957f297893487bd98fa830fa6413f3a70907";
        let t = target(hash, "static-commit", hash);
        let engine = engine_with(runner_with_tool(hash));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpToDate);

        let other = "0000000000000000000000000000000000000000";
        let t = target(hash, "static-commit", other);
        let engine = engine_with(runner_with_tool(hash));
        let decision = engine.decide(&t).await;
        // hashes do not order; any difference is an update
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);
    }

    #[tokio::test]
    async fn test_probe_timeout_is_probe_failed() {
        let t = target("1.0.0", "static-hang", "");
        let engine = engine_with(runner_with_tool("1.0.0"));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::ProbeFailed);
        let failure = decision.failure.unwrap();
        assert_eq!(failure.kind, "network");
        assert!(failure.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_probe_failed() {
        let t = target("1.0.0", "no-such-kind", "");
        let engine = engine_with(runner_with_tool("1.0.0"));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::ProbeFailed);
    }

    #[tokio::test]
    async fn test_bulk_zero_pending_short_circuits() {
        let runner = FakeRunner::new().script("apt-get -s -qq upgrade", CommandOutput::ok(""));
        let mut t = target("1.0.0", "static-version", "9.9.9");
        t.bulk = true;
        let engine = engine_with(runner);
        let decision = engine.decide(&t).await;
        // short-circuit: detection was never scripted, yet UP_TO_DATE
        assert_eq!(decision.status, DecisionStatus::UpToDate);
    }

    #[tokio::test]
    async fn test_bulk_pending_updates_run_full_pipeline() {
        let runner = FakeRunner::new()
            .script(
                "apt-get -s -qq upgrade",
                CommandOutput::ok("Inst vim [2:9.0-2] (2:9.0-3 Debian:bookworm)\n"),
            )
            .script("tool --version", CommandOutput::ok("tool 1.0.0\n"));
        let mut t = target("1.0.0", "static-version", "1.2.0");
        t.bulk = true;
        let engine = engine_with(runner);
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);
    }

    #[tokio::test]
    async fn test_bulk_check_failure_falls_back_to_full_pipeline() {
        // Regression guard for the safety invariant: the pending check is
        // unavailable (command missing), so a false "zero pending" must
        // not be assumed; the full pipeline runs and finds the update.
        let runner =
            FakeRunner::new().script("tool --version", CommandOutput::ok("tool 1.0.0\n"));
        let mut t = target("1.0.0", "static-version", "1.2.0");
        t.bulk = true;
        let engine = engine_with(runner);
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);
    }

    #[tokio::test]
    async fn test_bulk_check_nonzero_exit_falls_back() {
        let runner = FakeRunner::new()
            .script(
                "apt-get -s -qq upgrade",
                CommandOutput::new(100, "", "could not get lock"),
            )
            .script("tool --version", CommandOutput::ok("tool 1.0.0\n"));
        let mut t = target("1.0.0", "static-version", "1.2.0");
        t.bulk = true;
        let engine = engine_with(runner);
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);
    }

    #[tokio::test]
    async fn test_bulk_pacman_zero_pending() {
        // pacman -Qu signals "nothing pending" with exit 1, empty output
        let runner = FakeRunner::new().script("pacman -Qu", CommandOutput::new(1, "", ""));
        let mut t = target("1.0.0", "static-version", "9.9.9");
        t.bulk = true;
        t.source.manager = Some("pacman".to_string());
        let engine = engine_with(runner);
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpToDate);
    }

    #[tokio::test]
    async fn test_debian_revision_comparison() {
        let t = target("7.88.1-10", "static-version", "7.88.1-11");
        let engine = engine_with(runner_with_tool("7.88.1-10"));
        let decision = engine.decide(&t).await;
        assert_eq!(decision.status, DecisionStatus::UpdateAvailable);
    }
}
