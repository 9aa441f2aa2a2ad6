//! Test-management client
//!
//! The reporting engine only talks to the remote system through
//! [`TestManagementClient`]. [`TestRailClient`] implements it over the
//! TestRail v2 HTTP API.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Batch, Plan, Project, Run, RunId, TestInstance};

mod testrail;

#[cfg(test)]
pub(crate) mod mock;

pub use testrail::{ApiError, TestRailClient};

/// Operations the reporter consumes from the remote system
#[async_trait]
pub trait TestManagementClient: Send + Sync {
    /// Look up a project by its exact name
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>>;

    /// Look up a plan by its exact name within a project
    async fn find_plan_by_name(&self, project: &Project, name: &str) -> Result<Option<Plan>>;

    /// List the runs of a plan
    async fn list_runs(&self, plan: &Plan) -> Result<Vec<Run>>;

    /// List the test instances of a run
    async fn list_test_instances(&self, run: &Run) -> Result<Vec<TestInstance>>;

    /// Submit a batch of results to a run in a single call
    async fn submit_results(&self, run_id: RunId, batch: &Batch) -> Result<()>;
}
