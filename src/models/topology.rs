//! Plan topology models
//!
//! A plan is fetched once at suite start as a list of runs, each with the
//! test instances that bind a case to that run.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CaseId, InstanceId, RunId};

/// TestRail project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

/// Test plan within a project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: u64,
    pub name: String,
}

/// Run bucket within a plan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    #[serde(default)]
    pub name: String,
}

impl Run {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: RunId(id),
            name: name.into(),
        }
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.name)
        }
    }
}

/// Binding of a case to a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInstance {
    pub id: InstanceId,
    pub case_id: CaseId,
}

impl TestInstance {
    pub fn new(id: u64, case_id: u64) -> Self {
        Self {
            id: InstanceId(id),
            case_id: CaseId(case_id),
        }
    }
}

/// One run together with its member instances
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTopology {
    pub run: Run,
    pub instances: Vec<TestInstance>,
}

/// Every (run, case, instance) triple of the active plan, in fetch order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTopology {
    pub project: Option<String>,
    pub plan: Option<String>,
    pub runs: Vec<RunTopology>,
}

impl PlanTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_plan(project: impl Into<String>, plan: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            plan: Some(plan.into()),
            runs: Vec::new(),
        }
    }

    /// Add a run and its instances
    pub fn with_run(mut self, run: Run, instances: Vec<TestInstance>) -> Self {
        self.push_run(run, instances);
        self
    }

    pub fn push_run(&mut self, run: Run, instances: Vec<TestInstance>) {
        self.runs.push(RunTopology { run, instances });
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn instance_count(&self) -> usize {
        self.runs.iter().map(|r| r.instances.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instance_count() == 0
    }

    /// Flatten into (run, case, instance) triples
    pub fn triples(&self) -> impl Iterator<Item = (RunId, CaseId, InstanceId)> + '_ {
        self.runs.iter().flat_map(|entry| {
            entry
                .instances
                .iter()
                .map(move |instance| (entry.run.id, instance.case_id, instance.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlanTopology {
        PlanTopology::for_plan("Shop", "Release 1")
            .with_run(
                Run::new(10, "Checkout"),
                vec![TestInstance::new(5001, 101), TestInstance::new(5002, 102)],
            )
            .with_run(Run::new(11, "Search"), vec![TestInstance::new(6001, 201)])
    }

    #[test]
    fn test_counts() {
        let topology = sample();
        assert_eq!(topology.run_count(), 2);
        assert_eq!(topology.instance_count(), 3);
        assert!(!topology.is_empty());
        assert!(PlanTopology::new().is_empty());
    }

    #[test]
    fn test_triples_in_fetch_order() {
        let triples: Vec<_> = sample().triples().collect();
        assert_eq!(
            triples,
            vec![
                (RunId(10), CaseId(101), InstanceId(5001)),
                (RunId(10), CaseId(102), InstanceId(5002)),
                (RunId(11), CaseId(201), InstanceId(6001)),
            ]
        );
    }

    #[test]
    fn test_run_display() {
        assert_eq!(Run::new(10, "Checkout").to_string(), "R10 (Checkout)");
        assert_eq!(Run::new(10, "").to_string(), "R10");
    }
}
