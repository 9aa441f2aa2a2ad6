//! Parallel test completion
//!
//! Completes tests on concurrent worker tasks, the way a parallel test
//! framework would call the per-test hook from several threads at once.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use super::runner::OutcomeTally;
use crate::client::TestManagementClient;
use crate::models::TestOutcome;
use crate::reporting::SuiteCoordinator;

/// Run `on_test_complete` for every outcome on at most `workers` tasks
pub async fn complete_parallel<C>(
    coordinator: Arc<SuiteCoordinator<C>>,
    outcomes: Vec<TestOutcome>,
    workers: usize,
) -> OutcomeTally
where
    C: TestManagementClient + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        let semaphore = Arc::clone(&semaphore);
        let coordinator = Arc::clone(&coordinator);

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            debug!("Completing {}", outcome);
            coordinator.on_test_complete(&outcome)
        }));
    }

    let mut tally = OutcomeTally::default();
    for result in join_all(handles).await {
        match result {
            Ok(outcome) => tally.add(&outcome),
            Err(e) => error!("Completion task failed: {}", e),
        }
    }

    tally
}
