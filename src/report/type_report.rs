//! Per-type aggregation of stats and object reports

use crate::report::error_report::ErrorReport;
use crate::report::object_report::ObjectReport;
use crate::report::stats::Stats;
use crate::types::ObjectType;
use serde::Serialize;

/// Stats and object reports for a single object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReport {
    object_type: ObjectType,
    stats: Stats,
    object_reports: Vec<ObjectReport>,
}

impl TypeReport {
    pub fn new(object_type: ObjectType) -> Self {
        TypeReport {
            object_type,
            stats: Stats::new(),
            object_reports: Vec::new(),
        }
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    pub fn object_reports(&self) -> &[ObjectReport] {
        &self.object_reports
    }

    pub fn add_object_report(&mut self, report: ObjectReport) {
        self.object_reports.push(report);
    }

    /// Merges another report for the same type into this one
    ///
    /// Stats are summed and object reports appended; reports are never
    /// deduplicated because a later pass reports against other indices.
    ///
    /// # Panics
    ///
    /// Panics if the object types differ. Merging reports of different types
    /// is a caller bug, not a reportable condition.
    pub fn merge(&mut self, other: TypeReport) {
        assert_eq!(
            self.object_type, other.object_type,
            "cannot merge TypeReport for {} into TypeReport for {}",
            other.object_type, self.object_type
        );
        self.stats.merge(&other.stats);
        self.object_reports.extend(other.object_reports);
    }

    /// Iterates over all error reports in object report order
    pub fn error_reports(&self) -> impl Iterator<Item = &ErrorReport> {
        self.object_reports
            .iter()
            .flat_map(|report| report.error_reports().iter())
    }

    pub fn has_error_reports(&self) -> bool {
        self.error_reports().next().is_some()
    }

    /// True when no object of this type was counted in any pass
    pub fn is_prunable(&self) -> bool {
        self.stats.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::error_report::ErrorCode;

    fn report_with(object_type: ObjectType, indices: &[usize], created: usize) -> TypeReport {
        let mut report = TypeReport::new(object_type.clone());
        for &index in indices {
            let mut object_report = ObjectReport::new(object_type.clone(), index, None);
            object_report.add_error_report(ErrorReport::new(
                ErrorCode::E4000,
                object_type.clone(),
                ["name"],
            ));
            report.add_object_report(object_report);
        }
        for _ in 0..created {
            report.stats_mut().inc_created();
        }
        report
    }

    #[test]
    fn test_merge_sums_stats_and_concatenates() {
        let mut a = report_with(ObjectType::event(), &[0, 2], 1);
        let b = report_with(ObjectType::event(), &[2, 4], 3);

        a.merge(b);

        assert_eq!(a.stats().created(), 4);
        let indices: Vec<usize> = a.object_reports().iter().map(|r| r.index()).collect();
        assert_eq!(indices, vec![0, 2, 2, 4]);
        assert_eq!(a.error_reports().count(), 4);
    }

    #[test]
    #[should_panic(expected = "cannot merge TypeReport")]
    fn test_merge_rejects_different_types() {
        let mut a = TypeReport::new(ObjectType::event());
        a.merge(TypeReport::new(ObjectType::enrollment()));
    }

    #[test]
    fn test_is_prunable() {
        assert!(TypeReport::new(ObjectType::event()).is_prunable());
        assert!(!report_with(ObjectType::event(), &[], 1).is_prunable());
        assert!(report_with(ObjectType::event(), &[0], 0).is_prunable());
    }
}
