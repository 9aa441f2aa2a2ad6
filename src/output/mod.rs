//! Output formatting module
//!
//! Provides various output formats for suite reports and plan topology.

mod formatter;

pub use formatter::{write_report_to_file, OutputFormat, ReportFormatter};
