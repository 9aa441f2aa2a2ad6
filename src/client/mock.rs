//! In-memory client for tests
//!
//! Serves a fixed topology and records every submission.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::Notify;

use super::TestManagementClient;
use crate::models::{Batch, Plan, PlanTopology, Project, Run, RunId, TestInstance};

pub(crate) struct MockClient {
    project: String,
    plan: String,
    topology: PlanTopology,
    failing_runs: HashSet<RunId>,
    fail_fetch: bool,
    submissions: Mutex<Vec<(RunId, Batch)>>,
    hold: Option<SubmitHold>,
}

/// Parks the submission of one run until released
struct SubmitHold {
    run_id: RunId,
    entered: Notify,
    release: Notify,
}

impl MockClient {
    pub fn new(project: &str, plan: &str, topology: PlanTopology) -> Self {
        Self {
            project: project.to_string(),
            plan: plan.to_string(),
            topology,
            failing_runs: HashSet::new(),
            fail_fetch: false,
            submissions: Mutex::new(Vec::new()),
            hold: None,
        }
    }

    /// Block `submit_results` for `run_id` until [`MockClient::release`]
    pub fn hold_submission_for(mut self, run_id: RunId) -> Self {
        self.hold = Some(SubmitHold {
            run_id,
            entered: Notify::new(),
            release: Notify::new(),
        });
        self
    }

    /// Wait until the held run's submission is in flight
    pub async fn wait_until_held(&self) {
        if let Some(hold) = &self.hold {
            hold.entered.notified().await;
        }
    }

    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.release.notify_one();
        }
    }

    pub fn fail_submissions_for(mut self, run_id: RunId) -> Self {
        self.failing_runs.insert(run_id);
        self
    }

    pub fn fail_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn submissions(&self) -> Vec<(RunId, Batch)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl TestManagementClient for MockClient {
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        if self.fail_fetch {
            bail!("connection refused");
        }
        Ok((name == self.project).then(|| Project {
            id: 1,
            name: name.to_string(),
        }))
    }

    async fn find_plan_by_name(&self, _project: &Project, name: &str) -> Result<Option<Plan>> {
        Ok((name == self.plan).then(|| Plan {
            id: 7,
            name: name.to_string(),
        }))
    }

    async fn list_runs(&self, _plan: &Plan) -> Result<Vec<Run>> {
        Ok(self.topology.runs.iter().map(|r| r.run.clone()).collect())
    }

    async fn list_test_instances(&self, run: &Run) -> Result<Vec<TestInstance>> {
        Ok(self
            .topology
            .runs
            .iter()
            .filter(|r| r.run.id == run.id)
            .flat_map(|r| r.instances.iter().copied())
            .collect())
    }

    async fn submit_results(&self, run_id: RunId, batch: &Batch) -> Result<()> {
        if let Some(hold) = self.hold.as_ref().filter(|h| h.run_id == run_id) {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
        self.submissions
            .lock()
            .unwrap()
            .push((run_id, batch.clone()));
        if self.failing_runs.contains(&run_id) {
            bail!("HTTP 500 from add_results/{}", run_id.get());
        }
        Ok(())
    }
}
