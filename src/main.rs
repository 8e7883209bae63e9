//! testdrive - test program driver and report generator
//!
//! Runs independent test programs, normalizes what each reports into a
//! JSON result record, and turns streams of those records into JUnit XML
//! or AsciiDoc reports.
//!
//! ## Features
//!
//! - One JSON result per line on stdout, written as each test finishes
//! - Test identifiers built from a base URL or URN and the test's directory
//! - JUnit XML for CI systems, AsciiDoc for human-readable reports
//!
//! ## Usage
//!
//! ```bash
//! # Run the tests listed in tests.jsonl
//! testdrive run https://example.org/suite/ tests/tests.jsonl > results.jsonl
//!
//! # Convert the results
//! testdrive junit --hostname ci-7 nightly results.jsonl > junit.xml
//! testdrive asciidoc nightly results.jsonl > report.adoc
//!
//! # Or pipe straight through
//! testdrive run urn:acme:tests tests.jsonl | testdrive summary -
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

mod cli;
mod config;
mod executor;
mod models;
mod output;
mod source;
mod uri;
mod utils;

use cli::Args;
use config::{AppConfig, EnvConfig};
use executor::{Driver, TestRunner};
use output::{AsciidocReport, JunitReport, OutputFormat, ResultFormatter};
use source::{read_results, SpecSource};
use uri::UriBuilder;
use utils::io::{open_input, STDIN};
use utils::logger::{build_filter, init_logger, LogLevel};

/// Exit status of a process killed by SIGPIPE, as shells report it
const EXIT_BROKEN_PIPE: u8 = 141;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let env = EnvConfig::load();
    let config = match AppConfig::resolve(args.config.as_deref(), &env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("testdrive: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let level = LogLevel::parse(&config.log_level).unwrap_or(LogLevel::Info);
    let rust_log = std::env::var("RUST_LOG").ok();
    init_logger(build_filter(level, args.verbose, rust_log.as_deref()));
    if env.has_any() {
        debug!("Applied TESTDRIVE_* environment overrides");
    }
    debug!("Configuration: {:?}", config);

    let outcome = match args.command {
        cli::Command::Run(run_args) => run_tests(run_args, &config).await,
        cli::Command::Junit(junit_args) => write_junit(junit_args, &config),
        cli::Command::Asciidoc(asciidoc_args) => write_asciidoc(asciidoc_args, &config),
        cli::Command::Summary(summary_args) => write_summary(summary_args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_broken_pipe(&e) => ExitCode::from(EXIT_BROKEN_PIPE),
        Err(e) => {
            eprintln!("testdrive: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_tests(args: cli::RunArgs, config: &AppConfig) -> Result<()> {
    let query = config
        .query
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .chain(args.query);
    let builder = UriBuilder::with_query(&args.baseurl, query)?;
    let basedir = args.basedir.unwrap_or_else(|| default_basedir(&args.input));

    info!("Running tests from {} in {}", args.input, basedir.display());

    let driver_env = config.driver_env();
    if driver_env.is_empty() {
        debug!("Test programs run with an empty environment");
    } else {
        debug!("Passing {} environment variables to test programs", driver_env.len());
    }

    let runner = TestRunner::new(Driver::new(driver_env), builder, basedir)
        .timeless(args.timeless || config.timeless);

    let specs = SpecSource::new(open_input(&args.input)?);
    let mut stdout = io::stdout().lock();
    runner.run_all(specs, &mut stdout).await?;
    Ok(())
}

fn write_junit(args: cli::JunitArgs, config: &AppConfig) -> Result<()> {
    let results = load_results(&args.input)?;
    let exclude = if args.exclude.is_empty() {
        config.exclude.clone()
    } else {
        args.exclude
    };

    let report = JunitReport::new(args.suite)
        .hostname(args.hostname.or_else(|| config.hostname.clone()))
        .exclude(exclude)
        .prettify(args.prettify || config.prettify)
        .render(&results)?;

    write_stdout(&report)
}

fn write_asciidoc(args: cli::AsciidocArgs, config: &AppConfig) -> Result<()> {
    let results = load_results(&args.input)?;

    let report = AsciidocReport::new(args.suite)
        .hostname(args.hostname.or_else(|| config.hostname.clone()))
        .render(&results);

    write_stdout(&report)
}

fn write_summary(args: cli::SummaryArgs) -> Result<()> {
    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
    let results = load_results(&args.input)?;
    let summary = models::summarize(&results);

    info!("{}", summary);
    write_stdout(&ResultFormatter::new(format).format_summary(&summary, &results)?)
}

fn load_results(input: &str) -> Result<Vec<models::TestResult>> {
    let results = read_results(open_input(input)?)
        .with_context(|| format!("Failed to read results from {input}"))?;
    debug!("Loaded {} results from {}", results.len(), input);
    Ok(results)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}

/// Test programs are relative to the directory of the input file by default
fn default_basedir(input: &str) -> PathBuf {
    if input == STDIN {
        return PathBuf::from(".");
    }
    match Path::new(input).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `err` was caused by writing to a closed pipe
fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}
