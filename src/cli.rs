//! CLI argument parsing

use crate::context::{ConfirmPolicy, RunContext};
use crate::output::OutputFormat;
use crate::targets::TargetFilter;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Check heterogeneous software targets for updates and run their
/// update actions
#[derive(Parser, Debug, Clone)]
#[command(name = "sysup", version, about = "System and application update runner")]
pub struct CliArgs {
    /// Directory of target descriptors (one TOML file per target)
    #[arg(default_value = "targets")]
    pub targets_dir: PathBuf,

    /// Run every update action without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Report what would be updated without running any action
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Process only these target ids (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    /// Skip these target ids (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show disabled targets and extra detail
    #[arg(long)]
    pub verbose: bool,

    /// Suppress progress display
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Probe timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

impl CliArgs {
    /// Confirmation policy implied by the flags; dry-run wins over --yes
    pub fn policy(&self) -> ConfirmPolicy {
        if self.dry_run {
            ConfirmPolicy::DryRun
        } else if self.yes {
            ConfirmPolicy::AlwaysYes
        } else {
            ConfirmPolicy::AlwaysPrompt
        }
    }

    /// Build the run context from the flags
    pub fn context(&self) -> RunContext {
        let mut ctx = RunContext::new(self.policy())
            .with_probe_timeout(Duration::from_secs(self.timeout));
        ctx.color = !self.no_color && !self.json;
        // progress output would corrupt a JSON stream
        ctx.quiet = self.quiet || self.json;
        ctx
    }

    /// Target id filter from --only/--exclude
    pub fn filter(&self) -> TargetFilter {
        TargetFilter::new(self.only.clone(), self.exclude.clone())
    }

    /// Report output format
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}
