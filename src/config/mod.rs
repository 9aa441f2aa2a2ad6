//! Configuration module
//!
//! Settings are layered: built-in defaults, then a config file, then
//! `TESTRAIL_*` environment variables, then command-line flags.

pub mod env;
mod file;

pub use env::EnvConfig;
pub use file::ConfigFile;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::reporting::SuiteSettings;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// TestRail connection
    pub testrail: TestRailConfig,

    /// Project holding the active plan
    pub project: String,

    /// Active test plan results are reported to
    pub plan: String,

    /// User id submitted results are assigned to
    pub assignee_id: u64,

    /// Maximum concurrent run submissions at suite end
    pub max_concurrent: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            testrail: TestRailConfig::default(),
            project: "YourProjectName".to_string(),
            plan: "YourActiveTestPlanName".to_string(),
            assignee_id: 1,
            max_concurrent: 4,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from an optional file and the environment.
    ///
    /// Without an explicit path, `TESTRAIL_CONFIG` and then the standard
    /// locations are tried. The result is not validated: command-line
    /// overrides still apply, so call [`AppConfig::validate`] afterwards.
    pub fn resolve(path: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let file = match path {
            Some(path) => ConfigFile::load(path)?,
            None => match &env.config_file {
                Some(path) => ConfigFile::load(path)?,
                None => ConfigFile::load_default()?,
            },
        };

        let mut config = file.app;
        config.apply_env(env);
        Ok(config)
    }

    /// Override the target project and plan, e.g. from `--project`/`--plan`
    pub fn apply_target(&mut self, project: Option<&str>, plan: Option<&str>) {
        if let Some(project) = project {
            self.project = project.to_string();
        }
        if let Some(plan) = plan {
            self.plan = plan.to_string();
        }
    }

    /// Override fields set in the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(url) = &env.url {
            self.testrail.url = url.clone();
        }
        if let Some(username) = &env.username {
            self.testrail.username = username.clone();
        }
        if let Some(api_key) = &env.api_key {
            self.testrail.api_key = api_key.clone();
        }
        if let Some(timeout) = env.timeout {
            self.testrail.timeout_secs = timeout;
        }
        if let Some(project) = &env.project {
            self.project = project.clone();
        }
        if let Some(plan) = &env.plan {
            self.plan = plan.clone();
        }
        if let Some(assignee) = env.assignee {
            self.assignee_id = assignee;
        }
        if let Some(concurrency) = env.concurrency {
            self.max_concurrent = concurrency;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = &self.testrail.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("TestRail URL must start with http:// or https://, got '{url}'");
        }
        if self.project.trim().is_empty() {
            bail!("Project name must not be empty");
        }
        if self.plan.trim().is_empty() {
            bail!("Plan name must not be empty");
        }
        if self.max_concurrent == 0 {
            bail!("max_concurrent must be at least 1");
        }
        if self.testrail.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Settings handed to the suite coordinator
    pub fn suite_settings(&self) -> SuiteSettings {
        SuiteSettings::new(&self.project, &self.plan)
            .with_assignee(self.assignee_id)
            .with_max_concurrent(self.max_concurrent)
    }
}

/// TestRail connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestRailConfig {
    /// Instance URL, e.g. `https://example.testrail.io`
    pub url: String,

    /// Login email
    pub username: String,

    /// API key or password
    pub api_key: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TestRailConfig {
    fn default() -> Self {
        Self {
            url: "https://example.testrail.io".to_string(),
            username: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for TestRailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRailConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.project, "YourProjectName");
        assert_eq!(config.plan, "YourActiveTestPlanName");
        assert_eq!(config.assignee_id, 1);
        assert_eq!(config.testrail.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_env() {
        let mut config = AppConfig::default();
        let env = EnvConfig {
            url: Some("https://qa.testrail.io".to_string()),
            project: Some("Shop".to_string()),
            assignee: Some(7),
            ..Default::default()
        };
        config.apply_env(&env);

        assert_eq!(config.testrail.url, "https://qa.testrail.io");
        assert_eq!(config.project, "Shop");
        assert_eq!(config.plan, "YourActiveTestPlanName");
        assert_eq!(config.assignee_id, 7);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.testrail.url = "example.testrail.io".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.max_concurrent = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.plan = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_file_then_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reporter.yaml");
        std::fs::write(
            &path,
            "version: \"1.0\"\napp:\n  project: Shop\n  plan: Release 1\n  testrail:\n    url: https://shop.testrail.io\n",
        )
        .unwrap();

        let env = EnvConfig {
            plan: Some("Release 2".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(Some(&path), &env).unwrap();

        assert_eq!(config.project, "Shop");
        assert_eq!(config.plan, "Release 2");
        assert_eq!(config.testrail.url, "https://shop.testrail.io");
        assert_eq!(config.testrail.timeout_secs, 30);
    }

    #[test]
    fn test_blank_plan_in_file_overridden_by_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reporter.yaml");
        std::fs::write(&path, "app:\n  project: Shop\n  plan: \"\"\n").unwrap();

        let mut config = AppConfig::resolve(Some(&path), &EnvConfig::default()).unwrap();
        assert!(config.validate().is_err());

        config.apply_target(None, Some("Release 4"));
        assert!(config.validate().is_ok());
        assert_eq!(config.project, "Shop");
        assert_eq!(config.plan, "Release 4");
    }

    #[test]
    fn test_suite_settings() {
        let config = AppConfig {
            project: "Shop".to_string(),
            plan: "Release 1".to_string(),
            assignee_id: 3,
            max_concurrent: 2,
            ..Default::default()
        };
        let settings = config.suite_settings();
        assert_eq!(settings.project, "Shop");
        assert_eq!(settings.assignee_id, 3);
        assert_eq!(settings.max_concurrent_submissions, 2);
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let config = TestRailConfig {
            api_key: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
