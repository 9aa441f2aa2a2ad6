//! Output formatters for suite reports
//!
//! Provides table, JSON, CSV and one-line summary output.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::executor::SuiteReport;
use crate::models::PlanTopology;
use crate::reporting::{FlushReport, SuiteState};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Report formatter
pub struct ReportFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn json<T: Serialize>(&self, value: &T) -> String {
        if self.format == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.colorize {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// Format a replayed suite report
    pub fn format_report(&self, report: &SuiteReport) -> String {
        match self.format {
            OutputFormat::Table => self.format_report_table(report),
            OutputFormat::Json | OutputFormat::JsonPretty => self.json(report),
            OutputFormat::Csv => flush_csv(&report.flush).unwrap_or_default(),
            OutputFormat::Summary => self.format_report_brief(report),
        }
    }

    fn format_report_table(&self, report: &SuiteReport) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  Plan: {:53} ║\n", report.plan));
        output.push_str(&format!("║  Project: {:50} ║\n", report.project));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if report.state == SuiteState::Disabled {
            let reason = report.reporting_error.as_deref().unwrap_or("unknown reason");
            output.push_str(&format!(
                "║  {}\n",
                self.paint(&format!("Reporting disabled: {reason}"), "31")
            ));
        }

        let tally = &report.tally;
        output.push_str(&format!(
            "║  Tests: {:4} | Recorded: {:4} | Untagged: {:4}                 ║\n",
            tally.total(),
            tally.recorded,
            tally.untagged
        ));
        output.push_str(&format!(
            "║  Not in plan: {:4} | Malformed: {:4} | Dropped: {:4}            ║\n",
            tally.not_tracked, tally.malformed, tally.dropped
        ));
        output.push_str(&format!(
            "║  Submitted: {:4} | Failed: {:4} | Dropped late: {:4}            ║\n",
            report.flush.submitted_results(),
            report.flush.failed_results(),
            report.flush.dropped_late
        ));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        output.push_str(&self.format_flush_rows(&report.flush));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_flush_rows(&self, flush: &FlushReport) -> String {
        let mut output = String::new();

        if flush.submitted.is_empty() && flush.failed.is_empty() {
            output.push_str("║  No results submitted                                        ║\n");
            return output;
        }

        for sent in &flush.submitted {
            output.push_str(&format!(
                "║  {} {:10} {:5} results submitted                         ║\n",
                self.paint("✓", "32"),
                sent.run_id.to_string(),
                sent.results
            ));
        }
        for failed in &flush.failed {
            output.push_str(&format!(
                "║  {} {:10} {:5} results failed: {}\n",
                self.paint("✗", "31"),
                failed.run_id.to_string(),
                failed.results,
                failed.error
            ));
        }
        if flush.dropped_late > 0 {
            output.push_str(&format!(
                "║  {} {} late results dropped\n",
                self.paint("!", "33"),
                flush.dropped_late
            ));
        }

        output
    }

    fn format_report_brief(&self, report: &SuiteReport) -> String {
        format!(
            "{} / {}: {}/{} recorded, {} submitted to {} runs, {} failed in {} runs, {} dropped late [{}] in {}ms",
            report.project,
            report.plan,
            report.tally.recorded,
            report.tally.total(),
            report.flush.submitted_results(),
            report.flush.submitted.len(),
            report.flush.failed_results(),
            report.flush.failed.len(),
            report.flush.dropped_late,
            report.state,
            report.duration_ms
        )
    }

    /// Format a fetched plan topology
    pub fn format_topology(&self, topology: &PlanTopology) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => self.json(topology),
            OutputFormat::Csv => topology_csv(topology).unwrap_or_default(),
            OutputFormat::Summary => format!(
                "{}: {} runs, {} tests",
                topology.plan.as_deref().unwrap_or("plan"),
                topology.run_count(),
                topology.instance_count()
            ),
            OutputFormat::Table => self.format_topology_table(topology),
        }
    }

    fn format_topology_table(&self, topology: &PlanTopology) -> String {
        let mut output = String::new();

        output.push_str("\n┌──────────────┬──────────────────────────────────┬────────┐\n");
        output.push_str("│ Run          │ Name                             │ Tests  │\n");
        output.push_str("├──────────────┼──────────────────────────────────┼────────┤\n");
        for entry in &topology.runs {
            output.push_str(&format!(
                "│ {:12} │ {:32} │ {:6} │\n",
                entry.run.id.to_string(),
                entry.run.name,
                entry.instances.len()
            ));
        }
        output.push_str("└──────────────┴──────────────────────────────────┴────────┘\n");
        output.push_str(&format!(
            "{} runs, {} tests\n",
            topology.run_count(),
            topology.instance_count()
        ));

        output
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn flush_csv(flush: &FlushReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["run_id", "status", "results", "error"])?;
    for sent in &flush.submitted {
        writer.write_record([
            sent.run_id.get().to_string(),
            "submitted".to_string(),
            sent.results.to_string(),
            String::new(),
        ])?;
    }
    for failed in &flush.failed {
        writer.write_record([
            failed.run_id.get().to_string(),
            "failed".to_string(),
            failed.results.to_string(),
            failed.error.clone(),
        ])?;
    }
    finish_csv(writer)
}

fn topology_csv(topology: &PlanTopology) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["run_id", "run_name", "case_id", "test_id"])?;
    for entry in &topology.runs {
        for instance in &entry.instances {
            writer.write_record([
                entry.run.id.get().to_string(),
                entry.run.name.clone(),
                instance.case_id.get().to_string(),
                instance.id.get().to_string(),
            ])?;
        }
    }
    finish_csv(writer)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Write a suite report to a file
pub fn write_report_to_file(path: &str, report: &SuiteReport, format: OutputFormat) -> Result<()> {
    let formatter = ReportFormatter::new(format).no_color();
    let content = formatter.format_report(report);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::OutcomeTally;
    use crate::models::{Run, RunId, TestInstance};
    use crate::reporting::{RunFailure, RunSubmission};
    use chrono::Utc;

    fn report() -> SuiteReport {
        let now = Utc::now();
        SuiteReport {
            project: "Shop".to_string(),
            plan: "Release 1".to_string(),
            state: SuiteState::Done,
            reporting_error: None,
            tally: OutcomeTally {
                recorded: 3,
                untagged: 1,
                ..Default::default()
            },
            flush: FlushReport {
                started_at: now,
                completed_at: now,
                submitted: vec![RunSubmission {
                    run_id: RunId(10),
                    results: 2,
                }],
                failed: vec![RunFailure {
                    run_id: RunId(11),
                    results: 1,
                    error: "HTTP 500, \"oops\"".to_string(),
                }],
                dropped_late: 0,
            },
            duration_ms: 12,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_format_summary() {
        let output = ReportFormatter::new(OutputFormat::Summary).format_report(&report());
        assert!(output.starts_with("Shop / Release 1: 3/4 recorded, 2 submitted to 1 runs"));
        assert!(output.contains("[done]"));
    }

    #[test]
    fn test_summary_accounts_for_late_drops() {
        let mut late = report();
        late.flush.dropped_late = 1;
        let output = ReportFormatter::new(OutputFormat::Summary).format_report(&late);
        assert!(output.contains("1 failed in 1 runs, 1 dropped late"));

        let table = ReportFormatter::new(OutputFormat::Table)
            .no_color()
            .format_report(&late);
        assert!(table.contains("Submitted:    2 | Failed:    1 | Dropped late:    1"));
    }

    #[test]
    fn test_format_json() {
        let output = ReportFormatter::new(OutputFormat::Json).format_report(&report());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["flush"]["submitted"][0]["run_id"], 10);
        assert_eq!(value["state"], "done");
    }

    #[test]
    fn test_format_csv_escapes() {
        let output = ReportFormatter::new(OutputFormat::Csv).format_report(&report());
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "run_id,status,results,error");
        assert_eq!(lines[1], "10,submitted,2,");
        assert_eq!(lines[2], "11,failed,1,\"HTTP 500, \"\"oops\"\"\"");
    }

    #[test]
    fn test_format_table_no_color() {
        let output = ReportFormatter::new(OutputFormat::Table)
            .no_color()
            .format_report(&report());
        assert!(output.contains("Release 1"));
        assert!(output.contains("✓ R10"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_format_topology_csv() {
        let topology = PlanTopology::new()
            .with_run(Run::new(10, "Checkout"), vec![TestInstance::new(5001, 101)]);
        let output = ReportFormatter::new(OutputFormat::Csv).format_topology(&topology);
        assert_eq!(output, "run_id,run_name,case_id,test_id\n10,Checkout,101,5001\n");
    }
}
