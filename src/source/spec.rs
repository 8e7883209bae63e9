//! Test specifications
//!
//! Each line of input is a JSON array: the test program path followed by
//! its string arguments.

use std::fmt;
use std::io::{BufRead, Lines};
use thiserror::Error;

/// Errors reading test specifications
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("line {line}: invalid test specification: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: test specification names no program")]
    Empty { line: usize },

    #[error("failed to read test specifications: {0}")]
    Io(#[from] std::io::Error),
}

/// A test program and the arguments to run it with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestSpec {
    /// Program path, relative to the base directory
    pub program: String,
    pub args: Vec<String>,
}

impl TestSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a single specification line
    pub fn parse(line: &str, line_no: usize) -> Result<Self, SpecError> {
        let mut items: Vec<String> = serde_json::from_str(line).map_err(|source| SpecError::Json {
            line: line_no,
            source,
        })?;
        if items.is_empty() || items[0].is_empty() {
            return Err(SpecError::Empty { line: line_no });
        }
        let program = items.remove(0);
        Ok(Self::new(program, items))
    }

    /// Directory component of the program path, empty when there is none
    pub fn directory(&self) -> &str {
        self.program.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

impl fmt::Display for TestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Lazy, ordered source of test specifications
///
/// Lines are read on demand; blank lines are skipped. The source cannot be
/// restarted.
pub struct SpecSource<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> SpecSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for SpecSource<R> {
    type Item = Result<TestSpec, SpecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(TestSpec::parse(&line, self.line_no));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_spec() {
        let spec = TestSpec::parse(r#"["suite/a/run.sh", "--fast", "x y"]"#, 1).unwrap();
        assert_eq!(spec.program, "suite/a/run.sh");
        assert_eq!(spec.args, vec!["--fast", "x y"]);
        assert_eq!(spec.directory(), "suite/a");
        assert_eq!(spec.to_string(), "suite/a/run.sh --fast x y");
    }

    #[test]
    fn test_directory_of_bare_program() {
        assert_eq!(TestSpec::new("run.sh", vec![]).directory(), "");
        assert_eq!(TestSpec::new("/run.sh", vec![]).directory(), "");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            TestSpec::parse("[]", 3),
            Err(SpecError::Empty { line: 3 })
        ));
        assert!(matches!(
            TestSpec::parse(r#"["a", 1]"#, 4),
            Err(SpecError::Json { line: 4, .. })
        ));
        assert!(matches!(
            TestSpec::parse("not json", 5),
            Err(SpecError::Json { line: 5, .. })
        ));
    }

    #[test]
    fn test_source_is_lazy_and_ordered() {
        let input = "[\"a/t1\"]\n\n[\"b/t2\", \"x\"]\nbroken\n[\"c/t3\"]\n";
        let mut source = SpecSource::new(Cursor::new(input));

        assert_eq!(source.next().unwrap().unwrap().program, "a/t1");
        let second = source.next().unwrap().unwrap();
        assert_eq!(second.program, "b/t2");
        assert_eq!(second.args, vec!["x"]);
        assert!(matches!(
            source.next().unwrap(),
            Err(SpecError::Json { line: 4, .. })
        ));
        assert_eq!(source.next().unwrap().unwrap().program, "c/t3");
        assert!(source.next().is_none());
    }
}
