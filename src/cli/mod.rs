//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Test driver and report generator
#[derive(Parser, Debug)]
#[command(name = "testdrive")]
#[command(version)]
#[command(about = "Run test programs and report their results")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tests and print one JSON result per line
    Run(RunArgs),

    /// Convert results to JUnit XML
    Junit(JunitArgs),

    /// Convert results to AsciiDoc
    Asciidoc(AsciidocArgs),

    /// Summarize results
    Summary(SummaryArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory test programs are relative to [default: directory of INPUT]
    #[arg(short, long)]
    pub basedir: Option<PathBuf>,

    /// Do not record timestamps and times
    #[arg(short, long)]
    pub timeless: bool,

    /// Query pair appended to every test URI (repeatable)
    #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// Base URL or URN for test identifiers
    pub baseurl: String,

    /// Test specifications, one JSON array per line ("-" for stdin)
    pub input: String,
}

/// Arguments for junit command
#[derive(Parser, Debug)]
pub struct JunitArgs {
    /// Hostname shown in the report
    #[arg(long)]
    pub hostname: Option<String>,

    /// Keys to omit from <system-out> (repeatable or comma separated)
    #[arg(short, long, value_name = "KEY", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Indent the XML
    #[arg(short, long)]
    pub prettify: bool,

    /// Name of the test suite
    pub suite: String,

    /// Test results, one JSON object per line ("-" for stdin)
    pub input: String,
}

/// Arguments for asciidoc command
#[derive(Parser, Debug)]
pub struct AsciidocArgs {
    /// Hostname shown in the report
    #[arg(long)]
    pub hostname: Option<String>,

    /// Name of the test suite
    pub suite: String,

    /// Test results, one JSON object per line ("-" for stdin)
    pub input: String,
}

/// Arguments for summary command
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// Output format (json, json-pretty, table)
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Test results, one JSON object per line ("-" for stdin)
    pub input: String,
}

/// Parse a single `KEY=VALUE` pair
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
