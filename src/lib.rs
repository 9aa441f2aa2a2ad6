//! TestRail reporter - batch test-result reporting for TestRail plans
//!
//! Observes finished tests, correlates each one with a test case of an
//! active TestRail plan, batches the results per run and submits every
//! batch in a single call when the suite ends.
//!
//! ## Lifecycle
//!
//! ```no_run
//! use std::sync::Arc;
//! use testrail_reporter::client::TestRailClient;
//! use testrail_reporter::config::{AppConfig, EnvConfig};
//! use testrail_reporter::models::TestOutcome;
//! use testrail_reporter::reporting::SuiteCoordinator;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::resolve(None, &EnvConfig::load())?;
//! config.validate()?;
//! let client = Arc::new(TestRailClient::new(&config.testrail)?);
//! let mut suite = SuiteCoordinator::new(client, config.suite_settings());
//!
//! // Reporting failures never fail the tests themselves.
//! let _ = suite.start_suite().await;
//! suite.on_test_complete(&TestOutcome::success("checkout_total").with_case("101"));
//! suite.on_test_complete(&TestOutcome::failure("checkout_tax", "assert X").with_case("102"));
//! let report = suite.end_suite().await;
//! println!("{} results submitted", report.submitted_results());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod executor;
pub mod models;
pub mod output;
pub mod reporting;
pub mod utils;
