//! Reports for a single submitted object

use crate::report::error_report::ErrorReport;
use crate::types::{ObjectType, Uid};
use serde::Serialize;

/// The errors raised against one object of the submitted batch
///
/// `index` is the object's position in the submitted batch. It is fixed at
/// construction so that validate-time and commit-time reports for the same
/// object can be correlated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectReport {
    object_type: ObjectType,
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<Uid>,
    error_reports: Vec<ErrorReport>,
}

impl ObjectReport {
    pub fn new(object_type: ObjectType, index: usize, uid: Option<Uid>) -> Self {
        ObjectReport {
            object_type,
            index,
            uid,
            error_reports: Vec::new(),
        }
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn uid(&self) -> Option<&Uid> {
        self.uid.as_ref()
    }

    pub fn error_reports(&self) -> &[ErrorReport] {
        &self.error_reports
    }

    pub fn add_error_report(&mut self, report: ErrorReport) {
        self.error_reports.push(report);
    }

    pub fn add_error_reports(&mut self, reports: impl IntoIterator<Item = ErrorReport>) {
        self.error_reports.extend(reports);
    }

    pub fn has_errors(&self) -> bool {
        self.error_reports.iter().any(ErrorReport::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.error_reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::error_report::ErrorCode;

    #[test]
    fn test_new_report_is_empty() {
        let report = ObjectReport::new(ObjectType::event(), 3, Some(Uid::new("ZwwuwNp6gVd")));
        assert!(report.is_empty());
        assert!(!report.has_errors());
        assert_eq!(report.index(), 3);
        assert_eq!(report.uid().map(Uid::as_str), Some("ZwwuwNp6gVd"));
    }

    #[test]
    fn test_warning_only_report_has_no_errors() {
        let mut report = ObjectReport::new(ObjectType::enrollment(), 0, None);
        report.add_error_report(ErrorReport::warning(
            ErrorCode::E1300,
            ObjectType::enrollment(),
            ["rule", "check weight"],
        ));
        assert!(!report.is_empty());
        assert!(!report.has_errors());

        report.add_error_report(ErrorReport::new(
            ErrorCode::E1306,
            ObjectType::enrollment(),
            ["rule", "attr"],
        ));
        assert!(report.has_errors());
        assert_eq!(report.error_reports().len(), 2);
    }
}
