//! Human-readable text output

use crate::domain::{ActionDisposition, DecisionStatus, RunReport, TargetReport};
use crate::output::ReportFormatter;
use colored::Colorize;
use std::io::Write;

/// Text formatter for terminal display
pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    /// Create a text formatter
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn format_target(&self, record: &TargetReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let status = match (&record.decision, &record.action) {
            (_, ActionDisposition::Disabled) => "disabled".dimmed().to_string(),
            (_, ActionDisposition::Cancelled) => "cancelled".yellow().to_string(),
            (Some(decision), _) => match decision.status {
                DecisionStatus::UpToDate => decision.to_string().green().to_string(),
                DecisionStatus::UpdateAvailable => decision.to_string().yellow().to_string(),
                DecisionStatus::SecurityUpdateAvailable => {
                    decision.to_string().red().bold().to_string()
                }
                DecisionStatus::Absent => decision.to_string().dimmed().to_string(),
                DecisionStatus::ProbeFailed => decision.to_string().red().to_string(),
            },
            (None, _) => "no decision".dimmed().to_string(),
        };

        write!(writer, "  {:<20} {}", record.display_name, status)?;

        match &record.action {
            ActionDisposition::Invoked(outcome) if outcome.success => {
                write!(writer, "  {}", "updated".green())?;
            }
            ActionDisposition::Invoked(outcome) => {
                write!(writer, "  {}", format!("action failed: {}", outcome.message).red())?;
            }
            ActionDisposition::DryRun => write!(writer, "  {}", "(dry run)".dimmed())?,
            ActionDisposition::Declined => write!(writer, "  {}", "declined".dimmed())?,
            _ => {}
        }

        if let Some(verified) = record.verified {
            if verified {
                write!(writer, "  {}", "verified".green())?;
            } else {
                write!(writer, "  {}", "not verified".yellow())?;
            }
        }
        writeln!(writer)?;

        // per-target failure detail: actionable, never only a rollup
        if let Some(decision) = &record.decision {
            if let Some(failure) = &decision.failure {
                writeln!(
                    writer,
                    "      {} [{}] {}",
                    "probe error:".red(),
                    failure.source,
                    failure.message
                )?;
            }
        }
        Ok(())
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        for warning in &report.warnings {
            writeln!(writer, "{} {}", "warning:".yellow(), warning)?;
        }

        if report.targets.is_empty() {
            writeln!(writer, "no targets to process")?;
            return Ok(());
        }

        writeln!(writer)?;
        for record in &report.targets {
            let hidden = matches!(record.action, ActionDisposition::Disabled) && !self.verbose;
            if !hidden {
                self.format_target(record, writer)?;
            }
        }

        writeln!(writer)?;
        let mut rollup = vec![format!("{} targets checked", report.targets.len())];
        if report.updates_available() > 0 {
            rollup.push(format!("{} with updates", report.updates_available()));
        }
        if report.actions_succeeded() > 0 {
            rollup.push(format!("{} updated", report.actions_succeeded()));
        }
        if report.actions_failed() > 0 {
            rollup.push(format!("{} actions failed", report.actions_failed()));
        }
        if report.probe_failures() > 0 {
            rollup.push(format!("{} probes failed", report.probe_failures()));
        }
        writeln!(writer, "{}", rollup.join(", "))?;

        if report.interrupted {
            writeln!(writer, "{}", "run interrupted; remaining targets skipped".yellow())?;
        }
        if report.dry_run {
            writeln!(writer, "{}", "dry run: no actions were executed".dimmed())?;
        }
        Ok(())
    }
}
