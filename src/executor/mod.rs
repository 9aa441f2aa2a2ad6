//! Suite execution
//!
//! Replays recorded test outcomes through the reporting lifecycle,
//! sequentially or on concurrent workers.

mod parallel;
mod runner;

pub use parallel::complete_parallel;
pub use runner::{load_outcomes, OutcomeTally, SuiteReport, SuiteRunner};
