//! AsciiDoc output
//!
//! A summary table followed by a results table with one row per test case.

use crate::models::{format_seconds, format_timestamp, summarize, TestResult};

const NOT_KNOWN: &str = "_not known_";

/// AsciiDoc report generator
#[derive(Clone, Debug)]
pub struct AsciidocReport {
    suite: String,
    hostname: Option<String>,
}

impl AsciidocReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            hostname: None,
        }
    }

    /// Name of the host which ran the tests
    pub fn hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    /// Render `results` as an AsciiDoc section
    pub fn render(&self, results: &[TestResult]) -> String {
        let summary = summarize(results);
        let mut lines: Vec<String> = vec![
            format!("== Test Suite: {}", self.suite),
            String::new(),
            "==== Summary".to_string(),
            String::new(),
            "[cols=2*.^a]".to_string(),
            "|===".to_string(),
            String::new(),
        ];

        let started = summary
            .timestamp
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_else(|| NOT_KNOWN.to_string());
        let duration = summary
            .duration
            .map(format_seconds)
            .unwrap_or_else(|| NOT_KNOWN.to_string());

        lines.push(row(&["*hostname*", self.hostname.as_deref().unwrap_or(NOT_KNOWN)]));
        lines.push(row(&["*started*", started.as_str()]));
        lines.push(row(&["*duration (s)*", duration.as_str()]));
        for (label, count) in [
            ("*test cases*", summary.total),
            ("*test error*", summary.error),
            ("*test failure*", summary.failure),
            ("*test success*", summary.success),
        ] {
            lines.push(row(&[label, count.to_string().as_str()]));
        }
        lines.push("|===".to_string());
        lines.push(String::new());

        lines.push("==== Results".to_string());
        lines.push(String::new());
        lines.push("[%header,cols=5*.^a]".to_string());
        lines.push("|===".to_string());
        lines.push("|id|timestamp|duration (s)|result|reason".to_string());
        lines.push(String::new());

        for result in results {
            let (timestamp, time) = match &result.timing {
                Some(timing) => (format_timestamp(&timing.timestamp), format_seconds(timing.time)),
                None => (NOT_KNOWN.to_string(), NOT_KNOWN.to_string()),
            };
            let id = escape(result.id.as_deref().unwrap_or(""));
            let reason = escape(result.reason_text());
            lines.push(row(&[
                id.as_str(),
                timestamp.as_str(),
                time.as_str(),
                result.outcome.word(),
                reason.as_str(),
            ]));
        }
        lines.push("|===".to_string());

        lines.join("\n")
    }
}

/// One table row, each cell on its own line after a `|` marker
fn row(cells: &[&str]) -> String {
    format!("\n|\n{}", cells.join("\n|\n"))
}

/// Cell separators inside cell text must be escaped
fn escape(text: &str) -> String {
    text.replace('|', "\\|")
}
