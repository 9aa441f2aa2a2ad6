//! Data models for TestRail reporting
//!
//! Identifiers, plan topology, verdicts and result records shared by the
//! reporting engine and the client.

mod ids;
mod test_result;
mod topology;

pub use ids::{CaseId, InstanceId, RunId};
pub use test_result::{Batch, CaseTag, LocalStatus, ResultRecord, TestOutcome, Verdict};
pub use topology::{Plan, PlanTopology, Project, Run, RunTopology, TestInstance};
