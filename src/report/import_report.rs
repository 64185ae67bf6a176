//! Validation, commit and import reports
//!
//! All three reports share the same shape: a status plus an insertion-ordered
//! map from object type to [`TypeReport`]. The shared aggregation operations
//! live on the [`Report`] trait so each phase keeps its own type.

use crate::report::error_report::{ErrorCode, ErrorReport};
use crate::report::object_report::ObjectReport;
use crate::report::stats::Stats;
use crate::report::type_report::TypeReport;
use crate::types::{ImportStatus, ObjectType};
use indexmap::IndexMap;
use serde::Serialize;

/// Insertion-ordered collection of type reports, unique per object type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeReports(IndexMap<ObjectType, TypeReport>);

impl TypeReports {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, report: TypeReport) {
        match self.0.get_mut(report.object_type()) {
            Some(existing) => existing.merge(report),
            None => {
                self.0.insert(report.object_type().clone(), report);
            }
        }
    }

    fn clean(&mut self) {
        self.0.retain(|_, report| !report.is_prunable());
    }

    pub fn get(&self, object_type: &ObjectType) -> Option<&TypeReport> {
        self.0.get(object_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeReport> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Aggregation operations shared by every report phase
///
/// None of these operations fail; they only fold type reports together.
pub trait Report {
    fn type_reports(&self) -> &TypeReports;

    fn type_reports_mut(&mut self) -> &mut TypeReports;

    fn status(&self) -> ImportStatus;

    fn set_status(&mut self, status: ImportStatus);

    /// Adds a type report, merging into an existing entry for the same type
    fn add_type_report(&mut self, report: TypeReport) {
        self.type_reports_mut().add(report);
    }

    fn add_type_reports(&mut self, reports: impl IntoIterator<Item = TypeReport>)
    where
        Self: Sized,
    {
        for report in reports {
            self.add_type_report(report);
        }
    }

    /// Removes type reports whose stats total is zero
    fn clean(&mut self) {
        self.type_reports_mut().clean();
    }

    /// Sum of the stats of all type reports
    fn stats(&self) -> Stats {
        let mut stats = Stats::new();
        for report in self.type_reports().iter() {
            stats.merge(report.stats());
        }
        stats
    }

    fn type_report(&self, object_type: &ObjectType) -> Option<&TypeReport> {
        self.type_reports().get(object_type)
    }

    fn object_reports(&self) -> Vec<&ObjectReport> {
        self.type_reports()
            .iter()
            .flat_map(|report| report.object_reports().iter())
            .collect()
    }

    fn error_reports(&self) -> Vec<&ErrorReport> {
        self.type_reports()
            .iter()
            .flat_map(|report| report.error_reports())
            .collect()
    }

    fn for_each_error_report(&self, mut visitor: impl FnMut(&ErrorReport))
    where
        Self: Sized,
    {
        for report in self.type_reports().iter() {
            report.error_reports().for_each(&mut visitor);
        }
    }

    fn has_error_report(&self, predicate: impl Fn(&ErrorReport) -> bool) -> bool
    where
        Self: Sized,
    {
        self.type_reports()
            .iter()
            .any(|report| report.error_reports().any(&predicate))
    }

    fn error_reports_count(&self, code: ErrorCode) -> usize {
        self.type_reports()
            .iter()
            .map(|report| {
                report
                    .error_reports()
                    .filter(|error| error.error_code == code)
                    .count()
            })
            .sum()
    }

    fn has_errors(&self) -> bool {
        self.type_reports()
            .iter()
            .any(|report| report.error_reports().any(ErrorReport::is_error))
    }

    fn has_warnings(&self) -> bool {
        self.type_reports()
            .iter()
            .any(|report| report.error_reports().any(|error| !error.is_error()))
    }

    fn is_empty(&self) -> bool {
        self.type_reports().is_empty()
    }
}

macro_rules! phase_report {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct $name {
            status: ImportStatus,
            type_reports: TypeReports,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl Report for $name {
            fn type_reports(&self) -> &TypeReports {
                &self.type_reports
            }

            fn type_reports_mut(&mut self) -> &mut TypeReports {
                &mut self.type_reports
            }

            fn status(&self) -> ImportStatus {
                self.status
            }

            fn set_status(&mut self, status: ImportStatus) {
                self.status = status;
            }
        }
    };
}

phase_report!(
    /// Outcome of running the validators over a bundle
    ValidationReport
);

phase_report!(
    /// Outcome of handing the valid objects to the persistence collaborator
    CommitReport
);

phase_report!(
    /// Final outcome of one import call; the sole externally consumed artifact
    ImportReport
);

impl ImportReport {
    /// Folds the validation and commit phases into the final report
    ///
    /// Type reports are merged type by type (validation first), then
    /// zero-total entries are cleaned away.
    pub fn from_phases(
        status: ImportStatus,
        validation: ValidationReport,
        commit: CommitReport,
    ) -> Self {
        let mut report = ImportReport::new();
        report.set_status(status);
        report.add_type_reports(validation.type_reports.0.into_values());
        report.add_type_reports(commit.type_reports.0.into_values());
        report.clean();
        report
    }
}
