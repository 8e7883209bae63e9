//! Configuration module
//!
//! Handles loading and layering configuration: built-in defaults, then a
//! config file, then `TESTDRIVE_*` environment variables. Command-line
//! flags are applied last by the caller.

mod env;
mod file;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use env::{DriverEnv, EnvConfig};

use crate::output::DEFAULT_EXCLUDE;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version of config file format
    pub version: String,

    /// Name of the host running the tests, shown in reports
    pub hostname: Option<String>,

    /// Do not record timestamps and times for tests
    pub timeless: bool,

    /// Indent XML output
    pub prettify: bool,

    /// Keys omitted from the JSON in JUnit `<system-out>`
    pub exclude: Vec<String>,

    /// Query appended to every test URI
    pub query: BTreeMap<String, String>,

    /// Log level (debug, info, warn, error)
    pub log_level: String,

    /// Pass this process's environment to test programs
    pub inherit_env: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            hostname: None,
            timeless: false,
            prettify: false,
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            query: BTreeMap::new(),
            log_level: "info".to_string(),
            inherit_env: true,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from an explicit file, `TESTDRIVE_CONFIG`, or
    /// the standard locations, then apply environment overrides
    pub fn resolve(explicit: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_ref().map(PathBuf::from))
            .or_else(file::find);

        let mut config = match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                file::load(&path)?
            }
            None => Self::default(),
        };
        config.apply_env(env);
        file::validate(&config)?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(hostname) = &env.hostname {
            self.hostname = Some(hostname.clone());
        }
        if let Some(timeless) = env.timeless {
            self.timeless = timeless;
        }
        if let Some(prettify) = env.prettify {
            self.prettify = prettify;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
    }

    /// Environment for test programs
    pub fn driver_env(&self) -> DriverEnv {
        if self.inherit_env {
            DriverEnv::inherit()
        } else {
            DriverEnv::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.exclude, vec!["id", "timestamp", "time"]);
        assert!(!config.timeless);
        assert!(config.inherit_env);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.yaml");
        std::fs::write(&path, "hostname: from-file\ntimeless: false\n").unwrap();

        let env = EnvConfig {
            hostname: Some("from-env".to_string()),
            timeless: Some(true),
            ..Default::default()
        };
        let config = AppConfig::resolve(Some(path.as_path()), &env).unwrap();
        assert_eq!(config.hostname.as_deref(), Some("from-env"));
        assert!(config.timeless);
    }

    #[test]
    fn test_config_file_from_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"prettify": true}"#).unwrap();

        let env = EnvConfig {
            config_file: Some(path.display().to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(None, &env).unwrap();
        assert!(config.prettify);
    }

    #[test]
    fn test_bad_env_log_level_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.yaml");
        std::fs::write(&path, "version: \"1.0\"\n").unwrap();

        let env = EnvConfig {
            log_level: Some("chatty".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(Some(path.as_path()), &env).is_err());
    }

    #[test]
    fn test_driver_env_choice() {
        let config = AppConfig {
            inherit_env: false,
            ..AppConfig::default()
        };
        assert!(config.driver_env().is_empty());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
