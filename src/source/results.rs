//! Result streams
//!
//! Reads results written by the runner, one JSON object per line.

use anyhow::{Context, Result};
use std::io::BufRead;

use crate::models::TestResult;

/// Read all results from `reader`, skipping blank lines
pub fn read_results<R: BufRead>(reader: R) -> Result<Vec<TestResult>> {
    let mut results = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read results")?;
        if line.trim().is_empty() {
            continue;
        }
        let result: TestResult = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid test result", index + 1))?;
        results.push(result);
    }
    Ok(results)
}
