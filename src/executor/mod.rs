//! Test execution engine
//!
//! Runs test programs one at a time and turns their output into results.

mod driver;
mod runner;

pub use driver::Driver;
pub use runner::TestRunner;
