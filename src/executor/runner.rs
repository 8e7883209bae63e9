//! Test execution runner
//!
//! Drives each test specification in turn and streams the results.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::executor::Driver;
use crate::models::{ContractError, TestResult};
use crate::source::{SpecError, TestSpec};
use crate::uri::UriBuilder;
use crate::utils::timer::Stopwatch;

/// Sequential runner for test programs
pub struct TestRunner {
    driver: Driver,
    builder: UriBuilder,
    basedir: PathBuf,
    timeless: bool,
}

impl TestRunner {
    /// Create a new test runner; programs are resolved against `basedir`
    pub fn new(driver: Driver, builder: UriBuilder, basedir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            builder,
            basedir: basedir.into(),
            timeless: false,
        }
    }

    /// Do not record timestamps and times
    pub fn timeless(mut self, timeless: bool) -> Self {
        self.timeless = timeless;
        self
    }

    /// Run a single test
    pub async fn run_test(&self, spec: &TestSpec) -> Result<TestResult, ContractError> {
        let program = self.basedir.join(&spec.program);
        let stopwatch = (!self.timeless).then(Stopwatch::start);

        let mut result = self.driver.execute(&program, &spec.args).await?;
        if let Some(stopwatch) = stopwatch {
            result = result.with_timing(stopwatch.stop());
        }

        Ok(result.with_id(self.builder.build(spec.directory())))
    }

    /// Run every test from `specs` in order, writing each result to `out` as
    /// one JSON line as soon as it completes
    ///
    /// Returns the number of results written. Stops at the first malformed
    /// specification, contract violation, or write failure.
    pub async fn run_all<I, W>(&self, specs: I, out: &mut W) -> Result<usize>
    where
        I: IntoIterator<Item = Result<TestSpec, SpecError>>,
        W: Write,
    {
        let mut count = 0;

        for spec in specs {
            let spec = spec?;
            info!("Running {}", spec);

            let result = self
                .run_test(&spec)
                .await
                .with_context(|| format!("test {}", spec.program))?;
            info!("  {}", result);

            let line = serde_json::to_string(&result)?;
            writeln!(out, "{line}")?;
            out.flush()?;
            count += 1;
        }

        info!("Completed {} tests", count);
        Ok(count)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::DriverEnv;
    use crate::models::{summarize, Outcome};
    use crate::source::{read_results, SpecSource};
    use std::fs;
    use std::io::{self, Cursor};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn runner(dir: &TempDir, timeless: bool) -> TestRunner {
        TestRunner::new(
            Driver::new(DriverEnv::inherit()),
            UriBuilder::new("https://example.org/suite").unwrap(),
            dir.path(),
        )
        .timeless(timeless)
    }

    fn suite() -> TempDir {
        let dir = TempDir::new().unwrap();
        script(dir.path(), "foo/bar/pass", r#"echo '{"result": true}'"#);
        script(
            dir.path(),
            "foo/fail",
            r#"printf '%s\n' '{"result": false, "reason": "line one\nline two"}'"#,
        );
        script(dir.path(), "crash", "exit 3");
        dir
    }

    #[tokio::test]
    async fn test_run_test_stamps_id_and_timing() {
        let dir = suite();
        let spec = TestSpec::new("foo/bar/pass", vec!["a".to_string()]);

        let result = runner(&dir, false).run_test(&spec).await.unwrap();
        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.id.as_deref(), Some("https://example.org/suite/foo/bar/"));
        assert_eq!(result.argv, vec!["a".to_string()]);
        let timing = result.timing.unwrap();
        assert!(timing.time >= 0.0);
    }

    #[tokio::test]
    async fn test_timeless_has_no_timing() {
        let dir = suite();
        let spec = TestSpec::new("crash", vec![]);

        let result = runner(&dir, true).run_test(&spec).await.unwrap();
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.id.as_deref(), Some("https://example.org/suite/"));
        assert!(result.timing.is_none());
        assert!(result
            .reason
            .unwrap()
            .ends_with("crash exited with code 3"));
    }

    #[test]
    fn test_run_all_streams_results_in_order() {
        let dir = suite();
        let input = "[\"foo/bar/pass\"]\n[\"foo/fail\"]\n[\"crash\", \"--x\"]\n";
        let mut out = Vec::new();

        let count = tokio_test::block_on(
            runner(&dir, false).run_all(SpecSource::new(Cursor::new(input)), &mut out),
        )
        .unwrap();
        assert_eq!(count, 3);

        let results = read_results(Cursor::new(out)).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.clone().unwrap()).collect();
        assert_eq!(
            ids,
            vec![
                "https://example.org/suite/foo/bar/",
                "https://example.org/suite/foo/",
                "https://example.org/suite/",
            ]
        );
        assert_eq!(results[1].reason.as_deref(), Some("line one\nline two"));
        assert_eq!(results[2].argv, vec!["--x".to_string()]);

        let summary = summarize(&results);
        assert_eq!((summary.total, summary.failure, summary.error), (3, 1, 1));
        assert!(summary.timestamp.is_some());
        assert!(summary.duration.is_some());
    }

    #[test]
    fn test_run_all_stops_on_contract_violation() {
        let dir = suite();
        script(dir.path(), "bad", r#"echo '{"result": "passed"}'"#);
        let input = "[\"foo/bar/pass\"]\n[\"bad\"]\n[\"foo/fail\"]\n";
        let mut out = Vec::new();

        let err = tokio_test::block_on(
            runner(&dir, true).run_all(SpecSource::new(Cursor::new(input)), &mut out),
        )
        .unwrap_err();
        assert!(err.downcast_ref::<ContractError>().is_some());
        assert!(format!("{err:#}").contains("bad result"));

        // the result emitted before the violation is kept
        let results = read_results(Cursor::new(out)).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_run_all_stops_on_malformed_spec() {
        let dir = suite();
        let input = "[\"foo/bar/pass\"]\n{\"not\": \"a list\"}\n";
        let mut out = Vec::new();

        let err = tokio_test::block_on(
            runner(&dir, true).run_all(SpecSource::new(Cursor::new(input)), &mut out),
        )
        .unwrap_err();
        assert!(err.downcast_ref::<SpecError>().is_some());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_run_all_surfaces_broken_pipe() {
        let dir = suite();
        let input = "[\"foo/bar/pass\"]\n[\"foo/fail\"]\n";

        let err = tokio_test::block_on(
            runner(&dir, true).run_all(SpecSource::new(Cursor::new(input)), &mut ClosedPipe),
        )
        .unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    }
}
