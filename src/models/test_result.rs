//! Test result models
//!
//! Defines the canonical result record produced for every test program run,
//! the tri-state outcome, and the timing pair attached by the runner.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Violations of the result record contract
///
/// These are fatal: they mean a test program (or a stored record) is broken,
/// not that a test failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("missing result")]
    MissingOutcome,

    #[error("bad result {0}")]
    BadOutcome(String),

    #[error("timestamp {0:?} supplied without time")]
    TimestampWithoutTime(String),

    #[error("time {0} supplied without timestamp")]
    TimeWithoutTimestamp(f64),

    #[error("invalid timestamp {0:?}")]
    BadTimestamp(String),

    #[error("invalid time {0}")]
    BadTime(f64),
}

/// Verdict of a single test program
///
/// On the wire `Success` is JSON `true`, `Failure` is `false` and `Error`
/// is the string `"error"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failure,
    Error,
}

impl Outcome {
    /// Validate a raw `result` value
    pub fn from_value(value: &Value) -> Result<Self, ContractError> {
        match value {
            Value::Bool(true) => Ok(Outcome::Success),
            Value::Bool(false) => Ok(Outcome::Failure),
            Value::String(s) if s == "error" => Ok(Outcome::Error),
            Value::Null => Err(ContractError::MissingOutcome),
            other => Err(ContractError::BadOutcome(other.to_string())),
        }
    }

    /// Word used in human-readable reports
    pub fn word(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Error => "error",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Outcome::Success => "✓",
            Outcome::Failure => "✗",
            Outcome::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    fn to_value(self) -> Value {
        match self {
            Outcome::Success => Value::Bool(true),
            Outcome::Failure => Value::Bool(false),
            Outcome::Error => Value::String("error".to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Success => serializer.serialize_bool(true),
            Outcome::Failure => serializer.serialize_bool(false),
            Outcome::Error => serializer.serialize_str("error"),
        }
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Outcome::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Format a UTC instant the way results carry it (RFC 3339, microseconds)
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse an ISO 8601 / RFC 3339 instant into UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ContractError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ContractError::BadTimestamp(s.to_string()))
}

/// Render seconds the way reports show them: always with a fractional part
pub fn format_seconds(secs: f64) -> String {
    if secs.fract() == 0.0 && secs.is_finite() {
        format!("{secs:.1}")
    } else {
        secs.to_string()
    }
}

/// When a test started and how long it ran
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub timestamp: DateTime<Utc>,
    /// Duration in seconds
    pub time: f64,
}

impl Timing {
    /// The end instant must fit in microseconds since the epoch
    pub fn new(timestamp: DateTime<Utc>, time: f64) -> Result<Self, ContractError> {
        let timing = Self { timestamp, time };
        if !time.is_finite() || time < 0.0 || timing.checked_end_micros().is_none() {
            return Err(ContractError::BadTime(time));
        }
        Ok(timing)
    }

    pub fn start_micros(&self) -> i64 {
        self.timestamp.timestamp_micros()
    }

    /// End instant (`timestamp + time`) in microseconds since the epoch,
    /// saturating for timings not built through [`Timing::new`]
    pub fn end_micros(&self) -> i64 {
        self.checked_end_micros().unwrap_or(i64::MAX)
    }

    fn checked_end_micros(&self) -> Option<i64> {
        let micros = (self.time * 1e6).round();
        if !(0.0..i64::MAX as f64).contains(&micros) {
            return None;
        }
        self.start_micros().checked_add(micros as i64)
    }
}

/// Normalized result of a single test program run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResultRecord", into = "ResultRecord")]
pub struct TestResult {
    /// Canonical identifier, set by the runner
    pub id: Option<String>,
    pub outcome: Outcome,
    pub reason: Option<String>,
    pub timing: Option<Timing>,
    /// Arguments the program was invoked with
    pub argv: Vec<String>,
    /// Metadata supplied by the test program, passed through untouched
    pub extra: Map<String, Value>,
}

impl TestResult {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            id: None,
            outcome,
            reason: None,
            timing: None,
            argv: Vec::new(),
            extra: Map::new(),
        }
    }

    #[cfg(test)]
    pub fn success() -> Self {
        Self::new(Outcome::Success)
    }

    #[cfg(test)]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::new(Outcome::Failure).with_reason(reason)
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(Outcome::Error).with_reason(reason)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn with_argv(mut self, argv: &[String]) -> Self {
        self.argv = argv.to_vec();
        self
    }

    /// Reason text, empty when none was given
    pub fn reason_text(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.outcome.symbol(),
            self.id.as_deref().unwrap_or("<unidentified>")
        )?;
        if let Some(timing) = &self.timing {
            write!(f, " [{}s]", format_seconds(timing.time))?;
        }
        if !self.outcome.is_success() {
            if let Some(line) = self.reason_text().lines().next() {
                write!(f, " - {line}")?;
            }
        }
        Ok(())
    }
}

/// Flat wire form of a result, as written by test programs and the runner
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct ResultRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub result: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,

    #[serde(default)]
    pub argv: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<ResultRecord> for TestResult {
    type Error = ContractError;

    fn try_from(record: ResultRecord) -> Result<Self, Self::Error> {
        let outcome = Outcome::from_value(&record.result)?;
        let timing = match (record.timestamp, record.time) {
            (Some(timestamp), Some(time)) => Some(Timing::new(parse_timestamp(&timestamp)?, time)?),
            (None, None) => None,
            (Some(timestamp), None) => return Err(ContractError::TimestampWithoutTime(timestamp)),
            (None, Some(time)) => return Err(ContractError::TimeWithoutTimestamp(time)),
        };

        Ok(Self {
            id: record.id,
            outcome,
            reason: record.reason,
            timing,
            argv: record.argv,
            extra: record.extra,
        })
    }
}

impl From<TestResult> for ResultRecord {
    fn from(result: TestResult) -> Self {
        Self {
            id: result.id,
            result: result.outcome.to_value(),
            reason: result.reason,
            timestamp: result.timing.as_ref().map(|t| format_timestamp(&t.timestamp)),
            time: result.timing.map(|t| t.time),
            argv: result.argv,
            extra: result.extra,
        }
    }
}
