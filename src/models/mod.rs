//! Data models for test results
//!
//! This module contains the result record and the summary derived from it.

mod summary;
mod test_result;

pub use summary::{summarize, Summary};
pub use test_result::{
    format_seconds, format_timestamp, ContractError, Outcome, TestResult, Timing,
};
