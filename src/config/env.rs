//! Environment variable configuration
//!
//! Provides `TESTDRIVE_*` overrides and the explicit environment handed to
//! test programs.

use std::env;
use std::ffi::OsString;

/// Environment variable prefix
const ENV_PREFIX: &str = "TESTDRIVE";

/// Configuration read from `TESTDRIVE_*` environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Hostname from TESTDRIVE_HOSTNAME
    pub hostname: Option<String>,
    /// Timeless mode from TESTDRIVE_TIMELESS
    pub timeless: Option<bool>,
    /// Pretty XML from TESTDRIVE_PRETTIFY
    pub prettify: Option<bool>,
    /// Log level from TESTDRIVE_LOG
    pub log_level: Option<String>,
    /// Config file from TESTDRIVE_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, keyed by full variable name
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));
        Self {
            hostname: get("HOSTNAME"),
            timeless: get("TIMELESS").map(|v| parse_bool(&v)),
            prettify: get("PRETTIFY").map(|v| parse_bool(&v)),
            log_level: get("LOG"),
            config_file: get("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.hostname.is_some()
            || self.timeless.is_some()
            || self.prettify.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Environment passed to each test program
///
/// Captured once at startup and threaded into the driver, so child
/// processes never read ambient state the runner did not hand them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriverEnv {
    vars: Vec<(OsString, OsString)>,
}

impl DriverEnv {
    /// Snapshot of this process's environment
    pub fn inherit() -> Self {
        Self {
            vars: env::vars_os().collect(),
        }
    }

    /// An empty environment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set (or replace) a variable
    #[cfg(test)]
    pub fn set(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        let key = key.into();
        self.vars.retain(|(k, _)| *k != key);
        self.vars.push((key, value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &OsString)> {
        self.vars.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
