//! Logging setup
//!
//! Diagnostics for untracked cases, malformed ids and failed submissions are
//! all emitted through `tracing`; this module installs the subscriber.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Pick the level from an explicit flag, then `TESTRAIL_LOG`, then `--verbose`
    pub fn resolve(flag: Option<&str>, env: Option<&str>, verbose: bool) -> Self {
        flag.or(env)
            .and_then(Self::from_str)
            .unwrap_or(if verbose { LogLevel::Debug } else { LogLevel::Info })
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn default_directives(level: LogLevel) -> String {
    // HTTP internals stay quiet unless RUST_LOG asks for them.
    format!("testrail_reporter={},reqwest=warn,hyper=warn", Level::from(level))
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `level`.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(LogLevel::resolve(Some("warn"), Some("trace"), true), LogLevel::Warn);
        assert_eq!(LogLevel::resolve(None, Some(" ERROR "), true), LogLevel::Error);
        assert_eq!(LogLevel::resolve(None, None, true), LogLevel::Debug);
        assert_eq!(LogLevel::resolve(Some("loud"), None, false), LogLevel::Info);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(LogLevel::Debug),
            "testrail_reporter=DEBUG,reqwest=warn,hyper=warn"
        );
        assert_eq!(Level::from(LogLevel::default()), Level::INFO);
    }
}
