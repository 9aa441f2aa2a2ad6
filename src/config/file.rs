//! Configuration file management
//!
//! Handles finding, loading, and saving configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{AppConfig, TestRailConfig};
use crate::utils::is_yaml_path;

/// File names searched for in the working directory
const LOCAL_NAMES: &[&str] = &[
    "testrail-reporter.yaml",
    "testrail-reporter.yml",
    ".testrail-reporter.yaml",
];

/// Candidate config paths, most specific first: the working directory, the
/// user config directory, then a dotfile in the home directory.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = LOCAL_NAMES.iter().map(PathBuf::from).collect();
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("testrail-reporter").join("config.yaml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".testrail-reporter.yaml"));
    }
    paths
}

/// Full configuration file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        candidate_paths().into_iter().find(|path| path.is_file())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_path(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.check_version()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_path(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Reject file formats this version does not read; settings themselves
    /// are validated once every layer is applied
    fn check_version(&self) -> Result<()> {
        if self.version != default_version() {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }
        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            version: default_version(),
            app: AppConfig {
                testrail: TestRailConfig {
                    url: "https://example.testrail.io".to_string(),
                    username: "qa@example.com".to_string(),
                    api_key: "your-api-key".to_string(),
                    timeout_secs: 30,
                },
                project: "YourProjectName".to_string(),
                plan: "YourActiveTestPlanName".to_string(),
                assignee_id: 1,
                max_concurrent: 4,
            },
        }
    }
}
