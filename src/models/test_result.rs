//! Test outcome and result models
//!
//! Defines local execution status, remote verdicts, and the records that are
//! batched per run before submission.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::{CaseId, InstanceId};

/// Status reported by the test framework for a finished test
///
/// Parsing is total: anything that is not a recognised pass or fail spelling
/// (skipped, errored, blocked...) is `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LocalStatus {
    Success,
    Failure,
    Other,
}

impl LocalStatus {
    fn classify(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "success" | "pass" | "passed" => LocalStatus::Success,
            "failure" | "fail" | "failed" => LocalStatus::Failure,
            _ => LocalStatus::Other,
        }
    }
}

impl FromStr for LocalStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::classify(s))
    }
}

impl From<String> for LocalStatus {
    fn from(s: String) -> Self {
        Self::classify(&s)
    }
}

impl fmt::Display for LocalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalStatus::Success => write!(f, "SUCCESS"),
            LocalStatus::Failure => write!(f, "FAILURE"),
            LocalStatus::Other => write!(f, "OTHER"),
        }
    }
}

/// External verdict a submitted result is stamped with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Passed,
    Failed,
    Retest,
}

impl Verdict {
    /// TestRail system status id
    pub fn status_id(&self) -> u8 {
        match self {
            Verdict::Passed => 1,
            Verdict::Retest => 4,
            Verdict::Failed => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Passed => "Passed",
            Verdict::Failed => "Failed",
            Verdict::Retest => "Retest",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Verdict::Passed => "✓",
            Verdict::Failed => "✗",
            Verdict::Retest => "↻",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single result destined for one test instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub instance_id: InstanceId,
    pub verdict: Verdict,
    pub comment: Option<String>,
    pub assignee_id: u64,
}

impl ResultRecord {
    pub fn new(instance_id: InstanceId, verdict: Verdict, assignee_id: u64) -> Self {
        Self {
            instance_id,
            verdict,
            comment: None,
            assignee_id,
        }
    }

    pub fn with_comment(mut self, comment: Option<impl Into<String>>) -> Self {
        self.comment = comment.map(Into::into);
        self
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.verdict.symbol(), self.instance_id, self.verdict)?;
        if let Some(comment) = &self.comment {
            write!(f, " - {comment}")?;
        }
        Ok(())
    }
}

/// Ordered results for one run, in completion order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    records: Vec<ResultRecord>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, other: Batch) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }
}

impl From<Vec<ResultRecord>> for Batch {
    fn from(records: Vec<ResultRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a ResultRecord;
    type IntoIter = std::slice::Iter<'a, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Case reference read from a test's declared metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaseTag {
    /// No identifier declared; the test is not tracked remotely
    Untagged,
    Case(CaseId),
    /// Metadata present but not a numeric case id
    Malformed(String),
}

/// Completion event for one test method
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub method: String,
    pub status: LocalStatus,
    #[serde(default)]
    pub failure_message: Option<String>,
    /// Declared case identifier, as written on the test
    #[serde(default, alias = "case", alias = "description")]
    pub case_ref: Option<String>,
}

impl TestOutcome {
    pub fn new(method: impl Into<String>, status: LocalStatus) -> Self {
        Self {
            method: method.into(),
            status,
            failure_message: None,
            case_ref: None,
        }
    }

    pub fn success(method: impl Into<String>) -> Self {
        Self::new(method, LocalStatus::Success)
    }

    pub fn failure(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(method, LocalStatus::Failure).with_message(message)
    }

    pub fn with_case(mut self, case_ref: impl Into<String>) -> Self {
        self.case_ref = Some(case_ref.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Read the declared case identifier
    pub fn case_tag(&self) -> CaseTag {
        let raw = match self.case_ref.as_deref().map(str::trim) {
            None | Some("") => return CaseTag::Untagged,
            Some(raw) => raw,
        };

        match raw.parse::<CaseId>() {
            Ok(case_id) => CaseTag::Case(case_id),
            Err(_) => CaseTag::Malformed(raw.to_string()),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.method, self.status)?;
        if let Some(case_ref) = &self.case_ref {
            write!(f, " case={case_ref}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ids() {
        assert_eq!(Verdict::Passed.status_id(), 1);
        assert_eq!(Verdict::Retest.status_id(), 4);
        assert_eq!(Verdict::Failed.status_id(), 5);
    }

    #[test]
    fn test_local_status_spellings() {
        assert_eq!("PASS".parse(), Ok(LocalStatus::Success));
        assert_eq!(" failed ".parse(), Ok(LocalStatus::Failure));
        assert_eq!("skipped".parse(), Ok(LocalStatus::Other));

        let statuses: Vec<LocalStatus> =
            serde_json::from_str(r#"["Passed", "FAIL", "blocked", "success"]"#).unwrap();
        assert_eq!(
            statuses,
            vec![
                LocalStatus::Success,
                LocalStatus::Failure,
                LocalStatus::Other,
                LocalStatus::Success
            ]
        );
        assert_eq!(serde_json::to_string(&LocalStatus::Failure).unwrap(), "\"failure\"");
    }

    #[test]
    fn test_case_tag() {
        let outcome = TestOutcome::success("login");
        assert_eq!(outcome.case_tag(), CaseTag::Untagged);

        let outcome = TestOutcome::success("login").with_case("   ");
        assert_eq!(outcome.case_tag(), CaseTag::Untagged);

        let outcome = TestOutcome::success("login").with_case("101");
        assert_eq!(outcome.case_tag(), CaseTag::Case(CaseId(101)));

        let outcome = TestOutcome::success("login").with_case("C101");
        assert_eq!(outcome.case_tag(), CaseTag::Malformed("C101".to_string()));
    }

    #[test]
    fn test_outcome_deserialize_aliases() {
        let yaml = "method: checkout\nstatus: failure\nfailure_message: boom\ndescription: \"102\"\n";
        let outcome: TestOutcome = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(outcome.status, LocalStatus::Failure);
        assert_eq!(outcome.case_tag(), CaseTag::Case(CaseId(102)));
        assert_eq!(outcome.failure_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_batch_keeps_insertion_order() {
        let mut batch = Batch::new();
        batch.push(ResultRecord::new(InstanceId(2), Verdict::Failed, 1));
        batch.push(ResultRecord::new(InstanceId(1), Verdict::Passed, 1));

        let ids: Vec<_> = batch.iter().map(|r| r.instance_id).collect();
        assert_eq!(ids, vec![InstanceId(2), InstanceId(1)]);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_record_display() {
        let record = ResultRecord::new(InstanceId(5002), Verdict::Failed, 1)
            .with_comment(Some("assert X"));
        assert_eq!(record.to_string(), "✗ T5002 Failed - assert X");
    }
}
