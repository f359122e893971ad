//! JSON output for machine processing

use crate::domain::RunReport;
use crate::output::ReportFormatter;
use std::io::Write;

/// JSON formatter emitting the whole report as one document
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a JSON formatter
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &RunReport, writer: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, report)?;
        writeln!(writer)
    }
}
