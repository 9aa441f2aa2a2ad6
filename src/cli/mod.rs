//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Batch test-result reporter for TestRail test plans
#[derive(Parser, Debug)]
#[command(name = "testrail-reporter")]
#[command(version)]
#[command(about = "Report test outcomes to the runs of an active TestRail plan")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay recorded test outcomes and submit them to TestRail
    Report(ReportArgs),

    /// Show the runs and tests of the active plan
    Plan(PlanArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Plan selection shared by commands that talk to TestRail
#[derive(Parser, Debug, Clone, Default)]
pub struct TargetArgs {
    /// TestRail project name
    #[arg(long)]
    pub project: Option<String>,

    /// TestRail plan name
    #[arg(long)]
    pub plan: Option<String>,
}

/// Arguments for report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Recorded outcomes (JSON or YAML)
    #[arg(short = 'i', long)]
    pub outcomes: String,

    #[command(flatten)]
    pub target: TargetArgs,

    /// User id results are assigned to
    #[arg(long)]
    pub assignee: Option<u64>,

    /// Number of concurrent completion workers
    #[arg(short, long, default_value = "1")]
    pub workers: usize,

    /// Maximum concurrent run submissions
    #[arg(long)]
    pub concurrent: Option<usize>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Save report to file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Exit with an error if any run submission failed
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show resolved configuration
    Show,

    /// Write an example configuration file
    Init {
        /// Destination path
        #[arg(default_value = "testrail-reporter.yaml")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List supported environment variables
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        let args = Args::parse_from([
            "testrail-reporter",
            "report",
            "--outcomes",
            "results.json",
            "--plan",
            "Release 1",
            "--workers",
            "4",
        ]);

        match args.command {
            Command::Report(report) => {
                assert_eq!(report.outcomes, "results.json");
                assert_eq!(report.target.plan.as_deref(), Some("Release 1"));
                assert_eq!(report.workers, 4);
                assert_eq!(report.format, "table");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let args = Args::parse_from(["testrail-reporter", "-v", "config", "init", "--force"]);
        assert!(args.verbose);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { path, force },
            }) => {
                assert_eq!(path, "testrail-reporter.yaml");
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
