//! Report model: stats, error, object, type and phase reports

pub mod error_report;
pub mod import_report;
pub mod object_report;
pub mod stats;
pub mod type_report;

pub use error_report::{ErrorCode, ErrorReport};
pub use import_report::{CommitReport, ImportReport, Report, TypeReports, ValidationReport};
pub use object_report::ObjectReport;
pub use stats::Stats;
pub use type_report::TypeReport;
