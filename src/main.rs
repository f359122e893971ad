//! sysup - system and application update runner
//!
//! Loads target descriptors, decides per target whether an update is
//! available, and runs update actions subject to the confirmation policy.

use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use sysup::action::CommandUpdateAction;
use sysup::cli::CliArgs;
use sysup::command::{CommandRunner, SystemCommandRunner};
use sysup::context::StdinConfirmer;
use sysup::detect::InstalledVersionDetector;
use sysup::engine::UpdateDecisionEngine;
use sysup::http::HttpClient;
use sysup::orchestrator::Orchestrator;
use sysup::output::create_formatter;
use sysup::probe::ProbeRegistry;
use sysup::targets;
use sysup::version::VersionComparator;

#[tokio::main]
async fn main() -> ExitCode {
    run(CliArgs::parse()).await
}

async fn run(args: CliArgs) -> ExitCode {
    let ctx = args.context();

    if !ctx.color {
        colored::control::set_override(false);
    }

    // interrupts are honored between targets; the handler only flips the
    // flag so an in-flight package-manager transaction can finish
    let interrupt_flag = ctx.interrupt_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_flag.store(true, Ordering::SeqCst);
        }
    });

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());

    let http = match HttpClient::new(ctx.probe_timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let probes = ProbeRegistry::with_defaults(http, runner.clone());

    let loaded = match targets::load_all(&args.targets_dir, &probes) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if args.verbose {
        eprintln!(
            "sysup v{}: {} targets from {}",
            env!("CARGO_PKG_VERSION"),
            loaded.targets.len(),
            args.targets_dir.display()
        );
    }

    let engine = UpdateDecisionEngine::new(
        InstalledVersionDetector::new(runner.clone()),
        VersionComparator::with_native_detection(runner.clone()),
        probes,
        runner.clone(),
        ctx.clone(),
    );

    let orchestrator = Orchestrator::new(
        engine,
        Box::new(CommandUpdateAction::new(runner.clone())),
        Box::new(StdinConfirmer),
        runner,
        args.filter(),
        ctx,
    );

    let report = match orchestrator.run(&loaded.targets, &loaded.warnings).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let formatter = create_formatter(args.output_format(), args.verbose);
    let mut stdout = io::stdout().lock();
    if let Err(e) = formatter.format(&report, &mut stdout).and_then(|_| stdout.flush()) {
        eprintln!("error: failed to write report: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::from(report.exit_code())
}
