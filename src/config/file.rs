//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::AppConfig;
use crate::utils::logger::LogLevel;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./testdrive.yaml",
    "./testdrive.yml",
    "./.testdrive.yaml",
    "~/.config/testdrive/config.yaml",
];

/// Supported config file format versions
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Find configuration file in standard locations
pub fn find() -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(|location| expand_path(location))
        .find(|path| path.exists())
}

/// Load configuration from file
pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig = if is_yaml_file(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
    };

    validate(&config).with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

/// Validate configuration
pub fn validate(config: &AppConfig) -> Result<()> {
    if !SUPPORTED_VERSIONS.contains(&config.version.as_str()) {
        anyhow::bail!("Unsupported config version: {}", config.version);
    }

    if LogLevel::parse(&config.log_level).is_none() {
        anyhow::bail!("Unknown log level: {}", config.log_level);
    }

    if config.query.keys().any(|key| key.is_empty()) {
        anyhow::bail!("Query keys must not be empty");
    }

    Ok(())
}

/// Expand `~/` to the home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
