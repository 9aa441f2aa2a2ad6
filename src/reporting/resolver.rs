//! Case resolution
//!
//! Builds the case -> run and case -> test instance lookups from the plan
//! topology. The tables are filled once, before any test finishes, and are
//! read-only afterwards, so lookups need no locking.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::ReportError;
use crate::client::TestManagementClient;
use crate::models::{CaseId, InstanceId, PlanTopology, RunId};

/// Where a case's result must be submitted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub run_id: RunId,
    pub instance_id: InstanceId,
}

/// Lookup tables derived from the active plan
#[derive(Clone, Debug, Default)]
pub struct CaseResolver {
    case_to_run: HashMap<CaseId, RunId>,
    case_to_instance: HashMap<CaseId, InstanceId>,
    ambiguous: Vec<CaseId>,
}

impl CaseResolver {
    /// Build both lookups in a single pass over the topology.
    ///
    /// A case bound to more than one run resolves to the run processed last.
    pub fn initialize(topology: &PlanTopology) -> Self {
        let mut resolver = Self::default();

        for (run_id, case_id, instance_id) in topology.triples() {
            if let Some(previous) = resolver.case_to_run.insert(case_id, run_id) {
                if previous != run_id {
                    warn!(
                        "Case {} belongs to runs {} and {}; results go to {}",
                        case_id, previous, run_id, run_id
                    );
                    resolver.ambiguous.push(case_id);
                }
            }
            resolver.case_to_instance.insert(case_id, instance_id);
        }

        debug!(
            "Case resolver initialized: {} cases across {} runs",
            resolver.case_to_run.len(),
            topology.run_count()
        );

        resolver
    }

    /// Look up the run and instance for a case
    pub fn resolve(&self, case_id: CaseId) -> Option<Resolution> {
        let run_id = *self.case_to_run.get(&case_id)?;
        let instance_id = *self.case_to_instance.get(&case_id)?;
        Some(Resolution {
            run_id,
            instance_id,
        })
    }

    pub fn case_count(&self) -> usize {
        self.case_to_run.len()
    }

    pub fn is_empty(&self) -> bool {
        self.case_to_run.is_empty()
    }

    /// Cases that appeared in more than one run
    pub fn ambiguous_cases(&self) -> &[CaseId] {
        &self.ambiguous
    }
}

/// Fetch the run/test topology of a named plan
pub async fn load_topology<C>(
    client: &C,
    project_name: &str,
    plan_name: &str,
) -> Result<PlanTopology, ReportError>
where
    C: TestManagementClient + ?Sized,
{
    let fetch_err = |e: anyhow::Error| ReportError::TopologyFetch(format!("{e:#}"));

    let project = client
        .find_project_by_name(project_name)
        .await
        .map_err(fetch_err)?
        .ok_or_else(|| ReportError::ProjectNotFound(project_name.to_string()))?;

    let plan = client
        .find_plan_by_name(&project, plan_name)
        .await
        .map_err(fetch_err)?
        .ok_or_else(|| ReportError::PlanNotFound {
            project: project_name.to_string(),
            plan: plan_name.to_string(),
        })?;

    let mut topology = PlanTopology::for_plan(&project.name, &plan.name);
    for run in client.list_runs(&plan).await.map_err(fetch_err)? {
        let instances = client.list_test_instances(&run).await.map_err(fetch_err)?;
        debug!("Run {}: {} tests", run, instances.len());
        topology.push_run(run, instances);
    }

    info!(
        "Loaded plan '{}' of project '{}': {} runs, {} tests",
        plan.name,
        project.name,
        topology.run_count(),
        topology.instance_count()
    );

    Ok(topology)
}
