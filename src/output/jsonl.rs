#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable import reports
//!
//! Outputs one JSON object per line in a deterministic order:
//! 1. All error records (sorted by index, then error code)
//! 2. One summary record per object type (report order)
//! 3. One status record

use crate::report::{ImportReport, Report};
use serde::Serialize;

/// JSONL output formatter
pub struct JsonlFormatter;

impl JsonlFormatter {
    pub fn new() -> Self {
        JsonlFormatter
    }

    /// Format the import report as JSONL
    pub fn format(&self, report: &ImportReport) -> String {
        let mut output = String::new();

        let mut errors: Vec<ErrorRecord> = Vec::new();
        for object_report in report.object_reports() {
            for error in object_report.error_reports() {
                errors.push(ErrorRecord {
                    record_type: "error",
                    object_type: object_report.object_type().as_str().to_string(),
                    index: object_report.index(),
                    uid: object_report.uid().map(|uid| uid.to_string()),
                    error_code: error.error_code.as_str(),
                    severity: error.severity.as_str(),
                    message: error.message.clone(),
                    args: error.args.clone(),
                });
            }
        }
        errors.sort_by(|a, b| {
            a.index
                .cmp(&b.index)
                .then_with(|| a.error_code.cmp(b.error_code))
        });

        for error in errors {
            if let Ok(json) = serde_json::to_string(&error) {
                output.push_str(&json);
                output.push('\n');
            }
        }

        for type_report in report.type_reports().iter() {
            let stats = type_report.stats();
            let summary = SummaryRecord {
                record_type: "summary",
                object_type: type_report.object_type().as_str().to_string(),
                created: stats.created(),
                updated: stats.updated(),
                deleted: stats.deleted(),
                ignored: stats.ignored(),
                total: stats.total(),
            };
            if let Ok(json) = serde_json::to_string(&summary) {
                output.push_str(&json);
                output.push('\n');
            }
        }

        let stats = report.stats();
        let mut error_count = 0u64;
        let mut warning_count = 0u64;
        for error in report.error_reports() {
            if error.is_error() {
                error_count += 1;
            } else {
                warning_count += 1;
            }
        }
        let status = StatusRecord {
            record_type: "status",
            status: report.status().as_str(),
            created: stats.created(),
            updated: stats.updated(),
            deleted: stats.deleted(),
            ignored: stats.ignored(),
            total: stats.total(),
            errors: error_count,
            warnings: warning_count,
        };
        if let Ok(json) = serde_json::to_string(&status) {
            output.push_str(&json);
            output.push('\n');
        }

        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, report: &ImportReport) {
        print!("{}", self.format(report));
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct ErrorRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    object_type: String,
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<String>,
    error_code: &'static str,
    severity: &'static str,
    message: String,
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SummaryRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    object_type: String,
    created: u64,
    updated: u64,
    deleted: u64,
    ignored: u64,
    total: u64,
}

#[derive(Debug, Serialize)]
struct StatusRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    status: &'static str,
    created: u64,
    updated: u64,
    deleted: u64,
    ignored: u64,
    total: u64,
    errors: u64,
    warnings: u64,
}
