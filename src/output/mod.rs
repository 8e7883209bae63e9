//! Output formatting module
//!
//! JUnit XML and AsciiDoc reports, plus summary output for the terminal.

mod asciidoc;
mod formatter;
mod junit;

pub use asciidoc::AsciidocReport;
pub use formatter::{OutputFormat, ResultFormatter};
pub use junit::{JunitReport, DEFAULT_EXCLUDE};
