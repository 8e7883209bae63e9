//! Input sources
//!
//! Test specifications for the runner and result streams for the reports.

mod results;
mod spec;

pub use results::read_results;
pub use spec::{SpecError, SpecSource, TestSpec};
