//! Result correlation and aggregation engine
//!
//! Maps finished tests onto the runs of an active TestRail plan, batches the
//! translated results per run and flushes each batch in a single call at the
//! end of the suite.
//!
//! ## Error taxonomy
//!
//! - Project or plan missing upstream: reporting is disabled for the suite
//! - Case not in the plan, malformed case id: the record is dropped and logged
//! - Untagged test: skipped silently
//! - Failed submission: logged, other runs are still submitted

mod aggregator;
mod coordinator;
mod resolver;
mod translator;

pub use aggregator::ResultAggregator;
pub use coordinator::{
    FlushReport, RecordOutcome, RunFailure, RunSubmission, SuiteCoordinator, SuiteSettings,
    SuiteState,
};
pub use resolver::{load_topology, CaseResolver, Resolution};
pub use translator::translate;

use thiserror::Error;

use crate::models::{CaseId, RunId};

/// Reporting errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Requested project '{0}' does not exist")]
    ProjectNotFound(String),

    #[error("Requested test plan '{plan}' does not exist in project '{project}'")]
    PlanNotFound { project: String, plan: String },

    #[error("Failed to fetch plan topology: {0}")]
    TopologyFetch(String),

    #[error("Test case {0} is not present in the current test plan")]
    CaseNotTracked(CaseId),

    #[error("Malformed case identifier '{0}'")]
    MalformedCaseIdentifier(String),

    #[error("Failed to submit results to run {run_id}: {reason}")]
    SubmissionFailure { run_id: RunId, reason: String },
}

impl ReportError {
    /// Whether this error disables reporting for the whole suite
    pub fn is_topology_failure(&self) -> bool {
        matches!(
            self,
            ReportError::ProjectNotFound(_)
                | ReportError::PlanNotFound { .. }
                | ReportError::TopologyFetch(_)
        )
    }
}
