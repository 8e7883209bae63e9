//! Test program driver
//!
//! Runs one test program as a child process and normalizes what it reports.

use serde_json::{Map, Value};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::DriverEnv;
use crate::models::{ContractError, Outcome, TestResult};

/// Driver for test programs
///
/// A program passes the contract by exiting 0, writing nothing to stderr,
/// and printing one JSON object with a `result` of `true`, `false` or
/// `"error"`. Anything else short of a bad `result` value becomes an error
/// outcome.
#[derive(Clone, Debug)]
pub struct Driver {
    env: DriverEnv,
}

impl Driver {
    pub fn new(env: DriverEnv) -> Self {
        Self { env }
    }

    /// Execute `program` with `args`
    ///
    /// Fails only when the program reports an invalid `result`.
    pub async fn execute(&self, program: &Path, args: &[String]) -> Result<TestResult, ContractError> {
        debug!("Executing {} {:?}", program.display(), args);

        let output = match Command::new(program)
            .args(args)
            .env_clear()
            .envs(self.env.iter())
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to execute {}: {}", program.display(), e);
                let reason = format!("{} could not be executed: {e}", program.display());
                return Ok(TestResult::error(reason).with_argv(args));
            }
        };

        if !output.status.success() || !output.stderr.is_empty() {
            let mut reason = format!(
                "{} exited with code {}",
                program.display(),
                exit_code(&output.status)
            );
            if !output.stderr.is_empty() {
                reason.push_str("\n\n");
                reason.push_str(&String::from_utf8_lossy(&output.stderr));
            }
            return Ok(TestResult::error(reason).with_argv(args));
        }

        let report: Map<String, Value> = match serde_json::from_slice(&output.stdout) {
            Ok(report) => report,
            Err(e) => {
                let reason = format!("{} produced malformed output: {e}", program.display());
                return Ok(TestResult::error(reason).with_argv(args));
            }
        };

        Ok(from_report(report)?.with_argv(args))
    }
}

/// Keys the runner fills in itself; a program's own values are discarded
const RUNNER_KEYS: &[&str] = &["id", "timestamp", "time", "argv"];

/// Normalize the JSON object a program printed
///
/// Only `result` is checked. A non-string `reason` is kept as its JSON
/// text; every other key passes through as metadata.
fn from_report(mut report: Map<String, Value>) -> Result<TestResult, ContractError> {
    let outcome = Outcome::from_value(report.get("result").unwrap_or(&Value::Null))?;
    report.remove("result");

    let mut result = TestResult::new(outcome);
    match report.remove("reason") {
        Some(Value::String(reason)) => result = result.with_reason(reason),
        Some(Value::Null) | None => {}
        Some(other) => result = result.with_reason(other.to_string()),
    }

    for key in RUNNER_KEYS {
        if report.remove(*key).is_some() {
            debug!("Discarding {:?} reported by the test program", key);
        }
    }
    result.extra = report;
    Ok(result)
}

/// Exit code as a shell reports it; a negated signal number on signal death
fn exit_code(status: &ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(-1)
}
