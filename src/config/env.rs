//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "TESTRAIL";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Instance URL from TESTRAIL_URL
    pub url: Option<String>,
    /// Login from TESTRAIL_USER
    pub username: Option<String>,
    /// API key from TESTRAIL_API_KEY
    pub api_key: Option<String>,
    /// Project from TESTRAIL_PROJECT
    pub project: Option<String>,
    /// Plan from TESTRAIL_PLAN
    pub plan: Option<String>,
    /// Assignee user id from TESTRAIL_ASSIGNEE
    pub assignee: Option<u64>,
    /// Timeout from TESTRAIL_TIMEOUT
    pub timeout: Option<u64>,
    /// Submission concurrency from TESTRAIL_CONCURRENCY
    pub concurrency: Option<usize>,
    /// Config file from TESTRAIL_CONFIG
    pub config_file: Option<String>,
    /// Log level from TESTRAIL_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            url: get_env("URL"),
            username: get_env("USER"),
            api_key: get_env("API_KEY"),
            project: get_env("PROJECT"),
            plan: get_env("PLAN"),
            assignee: get_env_parse("ASSIGNEE"),
            timeout: get_env_parse("TIMEOUT"),
            concurrency: get_env_parse("CONCURRENCY"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.url.is_some()
            || self.username.is_some()
            || self.api_key.is_some()
            || self.project.is_some()
            || self.plan.is_some()
            || self.assignee.is_some()
            || self.timeout.is_some()
            || self.concurrency.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        let api_key = self.api_key.as_ref().map(|_| "<set>");
        println!("Environment Configuration:");
        println!("  {}_URL:         {:?}", ENV_PREFIX, self.url);
        println!("  {}_USER:        {:?}", ENV_PREFIX, self.username);
        println!("  {}_API_KEY:     {:?}", ENV_PREFIX, api_key);
        println!("  {}_PROJECT:     {:?}", ENV_PREFIX, self.project);
        println!("  {}_PLAN:        {:?}", ENV_PREFIX, self.plan);
        println!("  {}_ASSIGNEE:    {:?}", ENV_PREFIX, self.assignee);
        println!("  {}_TIMEOUT:     {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_CONCURRENCY: {:?}", ENV_PREFIX, self.concurrency);
        println!("  {}_CONFIG:      {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG:         {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.trim().parse().ok())
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    pub fn url(self, url: impl Into<String>) -> Self {
        self.var("URL", url)
    }

    pub fn project(self, project: impl Into<String>) -> Self {
        self.var("PROJECT", project)
    }

    pub fn plan(self, plan: impl Into<String>) -> Self {
        self.var("PLAN", plan)
    }

    pub fn assignee(self, assignee: u64) -> Self {
        self.var("ASSIGNEE", assignee.to_string())
    }

    pub fn concurrency(self, concurrency: usize) -> Self {
        self.var("CONCURRENCY", concurrency.to_string())
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all TESTRAIL environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_URL          TestRail instance URL");
    println!("  {ENV_PREFIX}_USER         TestRail login email");
    println!("  {ENV_PREFIX}_API_KEY      TestRail API key or password");
    println!("  {ENV_PREFIX}_PROJECT      Project holding the active plan");
    println!("  {ENV_PREFIX}_PLAN         Active test plan name");
    println!("  {ENV_PREFIX}_ASSIGNEE     User id results are assigned to");
    println!("  {ENV_PREFIX}_TIMEOUT      Request timeout in seconds");
    println!("  {ENV_PREFIX}_CONCURRENCY  Concurrent run submissions");
    println!("  {ENV_PREFIX}_CONFIG       Path to configuration file");
    println!("  {ENV_PREFIX}_LOG          Log level (trace, debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_URL=https://example.testrail.io");
    println!("  export {ENV_PREFIX}_PLAN=\"Release 1\"");
    println!("  testrail-reporter report --outcomes results.json");
}
