//! Report formatting
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::domain::RunReport;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Trait for report formatters
pub trait ReportFormatter {
    /// Format and write the run report
    fn format(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create a formatter for the requested format
pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}
