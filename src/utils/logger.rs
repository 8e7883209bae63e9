//! Logging setup
//!
//! Diagnostics go to stderr; stdout carries only results and reports.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Verbosity of diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Build the log filter
///
/// Valid `RUST_LOG` directives win; otherwise `verbose` means debug and
/// `level` applies to this crate only.
pub fn build_filter(level: LogLevel, verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(filter) = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return filter;
    }

    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        level.level_filter()
    };
    EnvFilter::new(format!("testdrive={level}"))
}

/// Install the global subscriber
pub fn init_logger(filter: EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("trace"), None);
    }

    #[test]
    fn test_verbose_raises_configured_level() {
        let filter = build_filter(LogLevel::Warn, true, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = build_filter(LogLevel::Warn, false, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_rust_log_wins() {
        let filter = build_filter(LogLevel::Info, true, Some("error"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
