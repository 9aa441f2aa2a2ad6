//! Suite lifecycle coordination
//!
//! Drives the three hook points of a suite:
//!
//! - `start_suite`: fetch the plan topology and build the case lookups
//! - `on_test_complete`: resolve, translate and batch one finished test
//! - `end_suite`: submit every non-empty batch, one call per run
//!
//! A missing project or plan disables reporting for the suite; tests keep
//! running and every later hook is a no-op.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::{load_topology, translate, CaseResolver, ReportError, ResultAggregator};
use crate::client::TestManagementClient;
use crate::models::{Batch, CaseId, CaseTag, InstanceId, ResultRecord, RunId, TestOutcome, Verdict};

/// Resolved settings for one suite
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteSettings {
    pub project: String,
    pub plan: String,
    /// User id every submitted result is assigned to
    pub assignee_id: u64,
    pub max_concurrent_submissions: usize,
}

impl SuiteSettings {
    pub fn new(project: impl Into<String>, plan: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            plan: plan.into(),
            assignee_id: 1,
            max_concurrent_submissions: 4,
        }
    }

    pub fn with_assignee(mut self, assignee_id: u64) -> Self {
        self.assignee_id = assignee_id;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_submissions = max.max(1);
        self
    }
}

/// Lifecycle state of a coordinator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteState {
    Uninitialized,
    Ready,
    Reporting,
    Done,
    Disabled,
}

impl fmt::Display for SuiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SuiteState::Uninitialized => "uninitialized",
            SuiteState::Ready => "ready",
            SuiteState::Reporting => "reporting",
            SuiteState::Done => "done",
            SuiteState::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// What happened to one completed test
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Accepted into its run's batch. A record accepted while the flush is
    /// under way can still end up in `FlushReport::dropped_late`.
    Recorded {
        run_id: RunId,
        instance_id: InstanceId,
        verdict: Verdict,
    },
    /// No case identifier declared on the test
    Untagged,
    NotTracked(CaseId),
    Malformed(String),
    /// Reporting is off for this suite
    Disabled,
    /// Arrived after the batches were flushed
    Dropped,
}

impl RecordOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, RecordOutcome::Recorded { .. })
    }
}

/// A batch that was accepted by the remote system
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSubmission {
    pub run_id: RunId,
    pub results: usize,
}

/// A batch whose submission failed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    pub run_id: RunId,
    pub results: usize,
    pub error: String,
}

/// Outcome of the end-of-suite flush
#[derive(Clone, Debug, Serialize)]
pub struct FlushReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub submitted: Vec<RunSubmission>,
    pub failed: Vec<RunFailure>,
    /// Records that arrived after their run was already flushed
    pub dropped_late: usize,
}

impl FlushReport {
    fn empty() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            completed_at: now,
            submitted: Vec::new(),
            failed: Vec::new(),
            dropped_late: 0,
        }
    }

    pub fn submitted_results(&self) -> usize {
        self.submitted.iter().map(|s| s.results).sum()
    }

    pub fn failed_results(&self) -> usize {
        self.failed.iter().map(|f| f.results).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }
}

enum Submission {
    Sent(RunSubmission),
    Failed(RunFailure),
}

/// Owns the resolver and aggregator for one suite execution
pub struct SuiteCoordinator<C: TestManagementClient + ?Sized> {
    client: Arc<C>,
    settings: SuiteSettings,
    resolver: CaseResolver,
    aggregator: ResultAggregator,
    state: RwLock<SuiteState>,
}

impl<C: TestManagementClient + ?Sized> SuiteCoordinator<C> {
    pub fn new(client: Arc<C>, settings: SuiteSettings) -> Self {
        Self {
            client,
            settings,
            resolver: CaseResolver::default(),
            aggregator: ResultAggregator::new(),
            state: RwLock::new(SuiteState::Uninitialized),
        }
    }

    pub fn state(&self) -> SuiteState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SuiteState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn settings(&self) -> &SuiteSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &CaseResolver {
        &self.resolver
    }

    /// Records waiting for the end-of-suite flush
    pub fn pending(&self) -> usize {
        self.aggregator.pending()
    }

    /// Fetch the plan topology and build the lookups.
    ///
    /// On failure the coordinator is disabled and the error is returned for
    /// the caller's information; tests should still run.
    pub async fn start_suite(&mut self) -> Result<(), ReportError> {
        let state = self.state();
        if state != SuiteState::Uninitialized {
            warn!("Suite already started (state: {}), ignoring", state);
            return Ok(());
        }

        info!(
            "Starting TestRail reporting for plan '{}' in project '{}'",
            self.settings.plan, self.settings.project
        );

        let loaded =
            load_topology(&*self.client, &self.settings.project, &self.settings.plan).await;
        match loaded {
            Ok(topology) => {
                self.resolver = CaseResolver::initialize(&topology);
                self.set_state(SuiteState::Ready);
                Ok(())
            }
            Err(e) => {
                error!("{}; reporting disabled for this suite", e);
                self.set_state(SuiteState::Disabled);
                Err(e)
            }
        }
    }

    /// Record the outcome of one finished test
    pub fn on_test_complete(&self, outcome: &TestOutcome) -> RecordOutcome {
        // Held across the append so the final sweep in `end_suite` sees it.
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        match *state {
            SuiteState::Ready | SuiteState::Reporting => {}
            SuiteState::Disabled => return RecordOutcome::Disabled,
            SuiteState::Uninitialized => {
                warn!(
                    "Test {} completed before the suite was started, not reported",
                    outcome.method
                );
                return RecordOutcome::Disabled;
            }
            SuiteState::Done => {
                warn!(
                    "Test {} completed after results were flushed, dropping result",
                    outcome.method
                );
                return RecordOutcome::Dropped;
            }
        }

        let case_id = match outcome.case_tag() {
            CaseTag::Untagged => return RecordOutcome::Untagged,
            CaseTag::Malformed(raw) => {
                warn!(
                    "Test {}: {}",
                    outcome.method,
                    ReportError::MalformedCaseIdentifier(raw.clone())
                );
                return RecordOutcome::Malformed(raw);
            }
            CaseTag::Case(case_id) => case_id,
        };

        let Some(resolution) = self.resolver.resolve(case_id) else {
            warn!(
                "Test {}: {}",
                outcome.method,
                ReportError::CaseNotTracked(case_id)
            );
            return RecordOutcome::NotTracked(case_id);
        };

        let verdict = translate(outcome.status);
        let record = ResultRecord::new(resolution.instance_id, verdict, self.settings.assignee_id)
            .with_comment(outcome.failure_message.clone());
        self.aggregator.append(resolution.run_id, record);

        debug!(
            "Test {} -> {} {} in run {}",
            outcome.method, resolution.instance_id, verdict, resolution.run_id
        );

        RecordOutcome::Recorded {
            run_id: resolution.run_id,
            instance_id: resolution.instance_id,
            verdict,
        }
    }

    /// Submit every non-empty batch, exactly once per run
    pub async fn end_suite(&self) -> FlushReport {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            match *state {
                SuiteState::Ready => *state = SuiteState::Reporting,
                SuiteState::Disabled => {
                    info!("Reporting disabled, nothing sent to TestRail");
                    return FlushReport::empty();
                }
                SuiteState::Uninitialized => {
                    warn!("Suite ended before it was started, nothing to report");
                    *state = SuiteState::Done;
                    return FlushReport::empty();
                }
                SuiteState::Reporting | SuiteState::Done => {
                    warn!("Results already flushed for this suite");
                    return FlushReport::empty();
                }
            }
        }

        let started_at = Utc::now();
        let pending = self.aggregator.drain();
        info!("Submitting results to {} runs", pending.len());

        let semaphore = Semaphore::new(self.settings.max_concurrent_submissions.max(1));
        let semaphore = &semaphore;
        let submissions = pending
            .into_iter()
            .map(move |(run_id, batch)| async move {
                let _permit = semaphore.acquire().await.ok();
                self.submit(run_id, batch).await
            });

        let mut report = FlushReport {
            started_at,
            ..FlushReport::empty()
        };
        for submission in join_all(submissions).await.into_iter().flatten() {
            match submission {
                Submission::Sent(sent) => report.submitted.push(sent),
                Submission::Failed(failed) => report.failed.push(failed),
            }
        }

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = SuiteState::Done;
            for (run_id, batch) in self.aggregator.drain() {
                warn!(
                    "Dropping {} results for run {} that arrived after it was flushed",
                    batch.len(),
                    run_id
                );
                report.dropped_late += batch.len();
            }
        }

        report.completed_at = Utc::now();
        info!(
            "Flush completed in {}ms - {} results in {} runs submitted, {} runs failed",
            report.duration_ms(),
            report.submitted_results(),
            report.submitted.len(),
            report.failed.len()
        );

        report
    }

    async fn submit(&self, run_id: RunId, mut batch: Batch) -> Option<Submission> {
        // Late records for this run ride along while it is still unsent.
        if let Some(late) = self.aggregator.take(run_id) {
            debug!("Merging {} late results into run {}", late.len(), run_id);
            batch.extend(late);
        }

        if batch.is_empty() {
            return None;
        }

        let results = batch.len();
        match self.client.submit_results(run_id, &batch).await {
            Ok(()) => {
                info!("Submitted {} results to run {}", results, run_id);
                Some(Submission::Sent(RunSubmission { run_id, results }))
            }
            Err(e) => {
                let err = ReportError::SubmissionFailure {
                    run_id,
                    reason: format!("{e:#}"),
                };
                error!("{}", err);
                Some(Submission::Failed(RunFailure {
                    run_id,
                    results,
                    error: err.to_string(),
                }))
            }
        }
    }
}
