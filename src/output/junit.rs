//! JUnit XML output
//!
//! One `<testsuite>` inside a `<testsuites>` root, one `<testcase>` per
//! result. Failure and error messages carry only the first line of the
//! reason; the full record goes to `<system-out>` as JSON.

use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::models::{format_seconds, format_timestamp, summarize, Outcome, TestResult};

/// Keys left out of `<system-out>` by default; they already appear as
/// attributes
pub const DEFAULT_EXCLUDE: &[&str] = &["id", "timestamp", "time"];

/// JUnit report generator
#[derive(Clone, Debug)]
pub struct JunitReport {
    suite: String,
    hostname: Option<String>,
    exclude: Vec<String>,
    prettify: bool,
}

impl JunitReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            hostname: None,
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            prettify: false,
        }
    }

    /// Name of the host which ran the tests
    pub fn hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    /// Keys to omit from the JSON object in `<system-out>`
    pub fn exclude(mut self, keys: Vec<String>) -> Self {
        self.exclude = keys;
        self
    }

    /// Indent the XML output
    pub fn prettify(mut self, prettify: bool) -> Self {
        self.prettify = prettify;
        self
    }

    /// Render `results` as a JUnit document
    pub fn render(&self, results: &[TestResult]) -> Result<String> {
        let summary = summarize(results);
        let mut writer = if self.prettify {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let counts = [
            ("tests", summary.total.to_string()),
            ("errors", summary.error.to_string()),
            ("failures", summary.failure.to_string()),
            ("skipped", "0".to_string()),
        ];

        let mut root = BytesStart::new("testsuites");
        push_attributes(&mut root, &counts);
        writer.write_event(Event::Start(root))?;

        let mut suite = BytesStart::new("testsuite");
        suite.push_attribute(("name", self.suite.as_str()));
        push_attributes(&mut suite, &counts);
        if let Some(hostname) = &self.hostname {
            suite.push_attribute(("hostname", hostname.as_str()));
        }
        if let Some(timestamp) = &summary.timestamp {
            suite.push_attribute(("timestamp", format_timestamp(timestamp).as_str()));
        }
        if let Some(duration) = summary.duration {
            suite.push_attribute(("time", format_seconds(duration).as_str()));
        }
        writer.write_event(Event::Start(suite))?;

        for result in results {
            self.write_testcase(&mut writer, result)?;
        }

        writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
        writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_testcase(&self, writer: &mut Writer<Vec<u8>>, result: &TestResult) -> Result<()> {
        let mut case = BytesStart::new("testcase");
        case.push_attribute(("classname", self.suite.as_str()));
        case.push_attribute(("name", result.id.as_deref().unwrap_or("")));
        if let Some(timing) = &result.timing {
            case.push_attribute(("time", format_seconds(timing.time).as_str()));
        }
        writer.write_event(Event::Start(case))?;

        match result.outcome {
            Outcome::Failure => write_message(writer, "failure", "Failure", result.reason_text())?,
            Outcome::Error => write_message(writer, "error", "Error", result.reason_text())?,
            Outcome::Success => {}
        }

        let system_out = self.system_out(result)?;
        writer.write_event(Event::Start(BytesStart::new("system-out")))?;
        writer.write_event(Event::Text(BytesText::new(&system_out)))?;
        writer.write_event(Event::End(BytesEnd::new("system-out")))?;

        writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        Ok(())
    }

    /// The result as sorted-key JSON, minus the excluded keys
    fn system_out(&self, result: &TestResult) -> Result<String> {
        let mut value = serde_json::to_value(result)?;
        if let Value::Object(map) = &mut value {
            for key in &self.exclude {
                map.remove(key);
            }
        }

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        value.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }
}

fn push_attributes(elem: &mut BytesStart<'_>, attrs: &[(&str, String)]) {
    for (key, value) in attrs {
        elem.push_attribute((*key, value.as_str()));
    }
}

fn write_message(writer: &mut Writer<Vec<u8>>, tag: &str, kind: &str, reason: &str) -> Result<()> {
    let mut elem = BytesStart::new(tag);
    elem.push_attribute(("type", kind));
    elem.push_attribute(("message", first_line(reason)));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("")
}
