//! Summary formatting
//!
//! Prints the aggregate of a result stream as JSON or as a table for the
//! terminal.

use anyhow::Result;

use crate::models::{Summary, TestResult};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Table,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "table" => Some(OutputFormat::Table),
            _ => None,
        }
    }
}

/// Summary formatter
pub struct ResultFormatter {
    format: OutputFormat,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format `summary`; the table form also lists every result
    pub fn format_summary(&self, summary: &Summary, results: &[TestResult]) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string(summary)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary)?,
            OutputFormat::Table => self.format_summary_table(summary, results),
        })
    }

    fn format_summary_table(&self, summary: &Summary, results: &[TestResult]) -> String {
        let mut output = String::new();

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        for result in results {
            output.push_str(&format!(" {result}\n"));
        }
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(" {summary}\n"));
        output.push_str(&format!(" Pass Rate: {:5.1}%\n", summary.pass_rate()));
        output.push_str("═══════════════════════════════════════════════════════════════");

        output
    }
}
