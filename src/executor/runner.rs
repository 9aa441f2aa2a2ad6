//! Suite replay runner
//!
//! Feeds a recorded list of test outcomes through the suite lifecycle:
//! start, one completion per outcome, end.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::parallel::complete_parallel;
use crate::client::TestManagementClient;
use crate::models::TestOutcome;
use crate::reporting::{FlushReport, RecordOutcome, SuiteCoordinator, SuiteSettings, SuiteState};
use crate::utils::is_yaml_path;

/// Outcome file layout: either a bare list or `{ outcomes: [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum OutcomeFile {
    List(Vec<TestOutcome>),
    Wrapped { outcomes: Vec<TestOutcome> },
}

/// Load recorded test outcomes from a JSON or YAML file
pub fn load_outcomes(path: impl AsRef<Path>) -> Result<Vec<TestOutcome>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read outcomes file: {}", path.display()))?;

    let file: OutcomeFile = if is_yaml_path(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML outcomes: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON outcomes: {}", path.display()))?
    };

    Ok(match file {
        OutcomeFile::List(outcomes) | OutcomeFile::Wrapped { outcomes } => outcomes,
    })
}

/// Count of completions by what happened to them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub recorded: usize,
    pub untagged: usize,
    pub not_tracked: usize,
    pub malformed: usize,
    pub disabled: usize,
    pub dropped: usize,
}

impl OutcomeTally {
    pub fn add(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Recorded { .. } => self.recorded += 1,
            RecordOutcome::Untagged => self.untagged += 1,
            RecordOutcome::NotTracked(_) => self.not_tracked += 1,
            RecordOutcome::Malformed(_) => self.malformed += 1,
            RecordOutcome::Disabled => self.disabled += 1,
            RecordOutcome::Dropped => self.dropped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.recorded + self.untagged + self.not_tracked + self.malformed + self.disabled + self.dropped
    }
}

/// Everything that happened during one replayed suite
#[derive(Clone, Debug, Serialize)]
pub struct SuiteReport {
    pub project: String,
    pub plan: String,
    pub state: SuiteState,
    /// Why reporting was disabled, if it was
    pub reporting_error: Option<String>,
    pub tally: OutcomeTally,
    pub flush: FlushReport,
    pub duration_ms: u64,
}

/// Replays outcomes through a suite coordinator
pub struct SuiteRunner<C: TestManagementClient + ?Sized> {
    client: Arc<C>,
    settings: SuiteSettings,
    workers: usize,
}

impl<C: TestManagementClient + ?Sized + 'static> SuiteRunner<C> {
    pub fn new(client: Arc<C>, settings: SuiteSettings) -> Self {
        Self {
            client,
            settings,
            workers: 1,
        }
    }

    /// Complete tests on `workers` concurrent tasks
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Run the suite lifecycle over `outcomes`
    pub async fn run(&self, outcomes: Vec<TestOutcome>) -> SuiteReport {
        let start = Instant::now();
        info!(
            "Replaying {} test outcomes ({} workers)",
            outcomes.len(),
            self.workers
        );

        let mut coordinator = SuiteCoordinator::new(Arc::clone(&self.client), self.settings.clone());
        let reporting_error = coordinator.start_suite().await.err().map(|e| e.to_string());
        let coordinator = Arc::new(coordinator);

        let tally = if self.workers > 1 {
            complete_parallel(Arc::clone(&coordinator), outcomes, self.workers).await
        } else {
            let mut tally = OutcomeTally::default();
            for outcome in &outcomes {
                tally.add(&coordinator.on_test_complete(outcome));
            }
            tally
        };

        let flush = coordinator.end_suite().await;

        let report = SuiteReport {
            project: self.settings.project.clone(),
            plan: self.settings.plan.clone(),
            state: coordinator.state(),
            reporting_error,
            tally,
            flush,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Suite completed in {}ms - {}/{} results recorded, {} submitted",
            report.duration_ms,
            report.tally.recorded,
            report.tally.total(),
            report.flush.submitted_results()
        );

        report
    }
}
