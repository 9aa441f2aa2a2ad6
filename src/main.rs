//! TestRail reporter - batch result reporting for TestRail test plans
//!
//! Replays recorded test outcomes through the suite lifecycle and submits
//! one batch of results per run of the active plan.
//!
//! ## Usage
//!
//! ```bash
//! # Report outcomes to the configured plan
//! testrail-reporter report --outcomes results.json
//!
//! # Override plan and complete tests on 4 workers
//! testrail-reporter report -i results.yaml --plan "Release 1" --workers 4
//!
//! # Show runs and tests of the active plan
//! testrail-reporter plan --format summary
//!
//! # Write an example configuration file
//! testrail-reporter config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use testrail_reporter::cli::{self, Args, TargetArgs};
use testrail_reporter::client::TestRailClient;
use testrail_reporter::config::{env::print_env_help, AppConfig, ConfigFile, EnvConfig};
use testrail_reporter::executor::{load_outcomes, SuiteRunner};
use testrail_reporter::output::{write_report_to_file, OutputFormat, ReportFormatter};
use testrail_reporter::reporting::load_topology;
use testrail_reporter::utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(LogLevel::resolve(
        args.log_level.as_deref(),
        env.log_level.as_deref(),
        args.verbose,
    ));

    match args.command {
        cli::Command::Report(report_args) => {
            let config = load_config(args.config.as_deref(), &env, &report_args.target)?;
            run_report(config, report_args).await?;
        }
        cli::Command::Plan(plan_args) => {
            let config = load_config(args.config.as_deref(), &env, &plan_args.target)?;
            show_plan(config, plan_args).await?;
        }
        cli::Command::Config(config_args) => {
            manage_config(args.config.as_deref(), &env, config_args)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>, env: &EnvConfig, target: &TargetArgs) -> Result<AppConfig> {
    let mut config = AppConfig::resolve(path.map(Path::new), env)?;
    config.apply_target(target.project.as_deref(), target.plan.as_deref());
    config.validate()?;
    Ok(config)
}

fn output_format(format: &str) -> OutputFormat {
    OutputFormat::from_str(format).unwrap_or_else(|| {
        warn!("Unknown output format '{}', using table", format);
        OutputFormat::Table
    })
}

async fn run_report(mut config: AppConfig, args: cli::ReportArgs) -> Result<()> {
    if let Some(assignee) = args.assignee {
        config.assignee_id = assignee;
    }
    if let Some(concurrent) = args.concurrent {
        config.max_concurrent = concurrent.max(1);
    }

    let outcomes = load_outcomes(&args.outcomes)?;
    info!(
        "Reporting {} outcomes to plan '{}' of project '{}'",
        outcomes.len(),
        config.plan,
        config.project
    );

    let client = Arc::new(TestRailClient::new(&config.testrail)?);
    let runner = SuiteRunner::new(client, config.suite_settings()).with_workers(args.workers);
    let report = runner.run(outcomes).await;

    let format = output_format(&args.format);
    println!("{}", ReportFormatter::new(format).format_report(&report));

    if let Some(output_path) = &args.output {
        write_report_to_file(output_path, &report, format)?;
        info!("Report saved to: {}", output_path);
    }

    if args.strict && !report.flush.is_success() {
        anyhow::bail!(
            "{} of {} run submissions failed",
            report.flush.failed.len(),
            report.flush.failed.len() + report.flush.submitted.len()
        );
    }

    Ok(())
}

async fn show_plan(config: AppConfig, args: cli::PlanArgs) -> Result<()> {
    let client = TestRailClient::new(&config.testrail)?;
    let topology = load_topology(&client, &config.project, &config.plan)
        .await
        .with_context(|| format!("Failed to load plan '{}'", config.plan))?;

    let formatter = ReportFormatter::new(output_format(&args.format));
    println!("{}", formatter.format_topology(&topology));

    Ok(())
}

fn manage_config(path: Option<&str>, env: &EnvConfig, args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Show => {
            let mut config = AppConfig::resolve(path.map(Path::new), env)?;
            if let Err(e) = config.validate() {
                warn!("Configuration is incomplete: {}", e);
            }
            if !config.testrail.api_key.is_empty() {
                config.testrail.api_key = "********".to_string();
            }
            println!("{}", serde_yaml::to_string(&config)?);
        }
        cli::ConfigAction::Init { path, force } => {
            if Path::new(&path).exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path);
            }
            ConfigFile::example().save(&path)?;
            println!("Configuration written to {}", path);
        }
        cli::ConfigAction::Env => {
            print_env_help();
            if env.has_any() {
                println!();
                env.print_summary();
            }
        }
    }

    Ok(())
}
