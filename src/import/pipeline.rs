#![forbid(unsafe_code)]

//! Validate-then-commit import pipeline
//!
//! The ImportPipeline coordinates one import call:
//! 1. Evaluates program rules over the bundle's tracked records
//! 2. Runs the validator chain over every object in batch order
//! 3. Holds back objects whose in-bundle parent cannot be persisted
//! 4. Persists the remaining objects in batch order, or in reverse batch
//!    order for deletions so children go before their parents
//! 5. Merges the validation and commit reports into the ImportReport
//!
//! Object reports carry the object's batch index in both phases.

use crate::engine::RuleEngine;
use crate::error::RuleError;
use crate::import::bundle::{BundleObject, ImportBundle};
use crate::import::notification::NotificationDispatcher;
use crate::import::params::{ImportMode, ImportParams, Operation, ValidationMode};
use crate::import::persistence::Persister;
use crate::import::validator::{
    ObjectValidator, ValidationContext, default_validators, object_identifier, stored_uid,
};
use crate::report::{
    CommitReport, ErrorCode, ErrorReport, ImportReport, ObjectReport, Report, TypeReport,
    ValidationReport,
};
use crate::rules::{BundleContext, ExecutorRegistry, ProgramRule, RecordKind, RuleEngineEffects};
use crate::types::{ImportStatus, ObjectType, Uid};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of one import call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Validating,
    Valid,
    Invalid,
    Committing,
    Committed,
    Aborted,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Received => "RECEIVED",
            PipelineState::Validating => "VALIDATING",
            PipelineState::Valid => "VALID",
            PipelineState::Invalid => "INVALID",
            PipelineState::Committing => "COMMITTING",
            PipelineState::Committed => "COMMITTED",
            PipelineState::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared flag for cancelling a running import
///
/// Cancelling before commit aborts without any persistence call. Cancelling
/// during commit only stops scheduling further objects.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one valid object during the commit pass
enum CommitOutcome {
    Written(Operation),
    Failed(ErrorReport),
    NotScheduled,
}

/// Result of the validation pass
struct Validated {
    report: ValidationReport,
    invalid: BTreeSet<usize>,
}

fn phase_status(has_errors: bool, has_warnings: bool, atomic: bool) -> ImportStatus {
    if has_errors && atomic {
        ImportStatus::Error
    } else if has_errors || has_warnings {
        ImportStatus::Warning
    } else {
        ImportStatus::Ok
    }
}

/// Property name of a reference, as used in report messages
fn reference_name(object_type: &ObjectType) -> String {
    if *object_type == ObjectType::tracked_entity() {
        "trackedEntity".to_string()
    } else if *object_type == ObjectType::enrollment() {
        "enrollment".to_string()
    } else {
        object_type.to_string()
    }
}

/// Runs bundles through validation and commit
pub struct ImportPipeline {
    params: ImportParams,
    rule_engine: RuleEngine,
    executors: ExecutorRegistry,
    validators: Vec<Box<dyn ObjectValidator>>,
    cancellation: CancellationToken,
    state: PipelineState,
}

impl ImportPipeline {
    pub fn new(params: ImportParams, rule_engine: RuleEngine, executors: ExecutorRegistry) -> Self {
        ImportPipeline {
            params,
            rule_engine,
            executors,
            validators: default_validators(),
            cancellation: CancellationToken::new(),
            state: PipelineState::Received,
        }
    }

    /// Pipeline with the default executors and validator chain
    pub fn with_defaults(params: ImportParams, rules: Vec<ProgramRule>) -> Result<Self, RuleError> {
        Ok(Self::new(
            params,
            RuleEngine::new(rules),
            ExecutorRegistry::with_defaults()?,
        ))
    }

    /// Replaces the validator chain
    pub fn with_validators(mut self, validators: Vec<Box<dyn ObjectValidator>>) -> Self {
        self.validators = validators;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn params(&self) -> &ImportParams {
        &self.params
    }

    /// State reached by the last run
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::info!(from = %self.state, to = %next, "import state transition");
        self.state = next;
    }

    /// Runs one import
    ///
    /// Expected failures (invalid objects, persistence errors, rule issues)
    /// are captured in the returned report; this never fails.
    ///
    /// # Arguments
    ///
    /// * `bundle` - The submitted objects
    /// * `store` - Persistence collaborator
    /// * `dispatcher` - Receives notification effects for committed records
    pub fn run(
        &mut self,
        bundle: &ImportBundle,
        store: &mut dyn Persister,
        dispatcher: &mut dyn NotificationDispatcher,
    ) -> ImportReport {
        self.state = PipelineState::Received;
        tracing::info!(
            objects = bundle.len(),
            import_mode = ?self.params.import_mode,
            atomic_mode = ?self.params.atomic_mode,
            "import received"
        );
        self.transition(PipelineState::Validating);

        let bundle_ctx = BundleContext::new(bundle, self.params.assign_overwrite);
        let effects = if self.params.skip_rule_engine {
            RuleEngineEffects::new()
        } else {
            self.rule_engine.evaluate(&bundle_ctx)
        };

        let objects = bundle.objects();
        let Validated {
            report: mut validation,
            mut invalid,
        } = {
            let ctx = ValidationContext::new(
                &self.params,
                &*store,
                &bundle_ctx,
                &effects,
                &self.executors,
            );
            self.validate(&ctx, &objects)
        };

        let status = phase_status(
            validation.has_errors(),
            validation.has_warnings(),
            self.params.is_atomic(),
        );
        validation.set_status(status);
        tracing::info!(
            status = %status,
            invalid = invalid.len(),
            "validation finished"
        );

        if status == ImportStatus::Error {
            self.transition(PipelineState::Invalid);
            self.transition(PipelineState::Aborted);
            let commit = self.unscheduled(&objects, &invalid);
            return ImportReport::from_phases(status, validation, commit);
        }
        self.transition(PipelineState::Valid);

        let held_back = self.hold_back_orphans(&*store, &objects, &mut validation, &mut invalid);
        if held_back > 0 {
            tracing::info!(held_back, "objects held back because a parent cannot be persisted");
        }

        if self.params.validate_only() {
            let commit = self.unscheduled(&objects, &invalid);
            return ImportReport::from_phases(status, validation, commit);
        }

        if self.cancellation.is_cancelled() {
            tracing::warn!("import cancelled before commit");
            self.transition(PipelineState::Aborted);
            let commit = self.unscheduled(&objects, &invalid);
            return ImportReport::from_phases(status, validation, commit);
        }

        self.transition(PipelineState::Committing);
        let (commit, rolled_back, written) = self.commit(store, &objects, &invalid);
        let final_status = status.max(commit.status());

        for type_report in commit.type_reports().iter() {
            let stats = type_report.stats();
            tracing::info!(
                object_type = %type_report.object_type(),
                created = stats.created(),
                updated = stats.updated(),
                deleted = stats.deleted(),
                ignored = stats.ignored(),
                "commit counts"
            );
        }

        if rolled_back {
            self.transition(PipelineState::Aborted);
        } else {
            self.notify(dispatcher, &effects, &objects, &written);
            self.transition(PipelineState::Committed);
        }

        ImportReport::from_phases(final_status, validation, commit)
    }

    /// Runs the validator chain over every object in batch order
    ///
    /// Objects with an error-severity report are invalid and counted as
    /// ignored. In FAIL_FAST mode everything after the first invalid object
    /// is counted as ignored without being validated.
    fn validate(&self, ctx: &ValidationContext, objects: &[BundleObject]) -> Validated {
        let mut report = ValidationReport::new();
        let mut invalid = BTreeSet::new();
        let fail_fast = self.params.validation_mode == ValidationMode::FailFast;
        let skip = self.params.validation_mode == ValidationMode::Skip;
        let mut stopped = false;

        for (index, object) in objects.iter().enumerate() {
            let mut type_report = TypeReport::new(object.object_type());

            if stopped {
                invalid.insert(index);
                type_report.stats_mut().inc_ignored();
                report.add_type_report(type_report);
                continue;
            }

            let mut errors = Vec::new();
            for validator in self.validators.iter().filter(|v| !skip || v.always_run()) {
                let found = validator.validate(ctx, index, object);
                if !found.is_empty() {
                    tracing::debug!(
                        validator = validator.name(),
                        index,
                        reports = found.len(),
                        "validator reported"
                    );
                }
                let blocking = found.iter().any(ErrorReport::is_error);
                errors.extend(found);
                if fail_fast && blocking {
                    break;
                }
            }

            if !errors.is_empty() {
                let uid = Some(object.uid().clone()).filter(|uid| !uid.as_str().is_empty());
                let mut object_report = ObjectReport::new(object.object_type(), index, uid);
                object_report.add_error_reports(errors);
                if object_report.has_errors() {
                    invalid.insert(index);
                    type_report.stats_mut().inc_ignored();
                    stopped = fail_fast;
                }
                type_report.add_object_report(object_report);
            }
            report.add_type_report(type_report);
        }

        Validated { report, invalid }
    }

    /// Marks objects whose in-bundle parent cannot be persisted as invalid
    ///
    /// A parent cannot be persisted when it is invalid (or itself held back)
    /// and is not already stored. Each held back object gets an E5005 report
    /// in the validation phase and is counted as ignored. Deletions are left
    /// to the store, which refuses to delete a referenced object.
    ///
    /// Returns the number of objects held back.
    fn hold_back_orphans(
        &self,
        store: &dyn Persister,
        objects: &[BundleObject],
        validation: &mut ValidationReport,
        invalid: &mut BTreeSet<usize>,
    ) -> usize {
        if self.params.import_mode == ImportMode::Delete || invalid.is_empty() {
            return 0;
        }

        let mut blocked: HashSet<(ObjectType, &Uid)> = invalid
            .iter()
            .map(|&index| (objects[index].object_type(), objects[index].uid()))
            .collect();
        let mut held_back = 0;

        for (index, object) in objects.iter().enumerate() {
            if invalid.contains(&index) {
                continue;
            }
            let Some((parent_type, parent_uid)) =
                object.references().into_iter().find(|(parent_type, parent_uid)| {
                    blocked.contains(&(parent_type.clone(), *parent_uid))
                        && !store.exists(parent_type, parent_uid)
                })
            else {
                continue;
            };

            let object_type = object.object_type();
            let mut object_report =
                ObjectReport::new(object_type.clone(), index, Some(object.uid().clone()));
            object_report.add_error_report(ErrorReport::new(
                ErrorCode::E5005,
                object_type.clone(),
                [
                    object_type.to_string(),
                    object.uid().to_string(),
                    reference_name(&parent_type),
                    parent_uid.to_string(),
                ],
            ));
            let mut type_report = TypeReport::new(object_type.clone());
            type_report.add_object_report(object_report);
            type_report.stats_mut().inc_ignored();
            validation.add_type_report(type_report);

            invalid.insert(index);
            blocked.insert((object_type, object.uid()));
            held_back += 1;
        }
        held_back
    }

    /// Commit report counting every valid object as ignored
    fn unscheduled(&self, objects: &[BundleObject], invalid: &BTreeSet<usize>) -> CommitReport {
        let mut commit = CommitReport::new();
        for (index, object) in objects.iter().enumerate() {
            if invalid.contains(&index) {
                continue;
            }
            let mut type_report = TypeReport::new(object.object_type());
            type_report.stats_mut().inc_ignored();
            commit.add_type_report(type_report);
        }
        commit
    }

    /// Persists valid objects
    ///
    /// Objects are written in batch order; deletions run in reverse batch
    /// order. Reports always carry the batch index and list objects in batch
    /// order.
    ///
    /// Returns the commit report, whether the batch was rolled back, and the
    /// indices of the objects that were written.
    fn commit(
        &self,
        store: &mut dyn Persister,
        objects: &[BundleObject],
        invalid: &BTreeSet<usize>,
    ) -> (CommitReport, bool, Vec<usize>) {
        let atomic = self.params.is_atomic();
        let id_scheme = self.params.id_scheme;
        let mut outcomes: Vec<(usize, CommitOutcome)> = Vec::new();
        let mut rolled_back = false;
        let mut halted = false;

        let order: Vec<usize> = if self.params.import_mode == ImportMode::Delete {
            (0..objects.len()).rev().collect()
        } else {
            (0..objects.len()).collect()
        };

        store.begin();
        for index in order {
            if invalid.contains(&index) {
                continue;
            }
            if halted || self.cancellation.is_cancelled() {
                outcomes.push((index, CommitOutcome::NotScheduled));
                continue;
            }

            let object = &objects[index];
            let stored = stored_uid(&*store, id_scheme, object);
            let operation = self.params.import_mode.operation(stored.is_some());
            let target = stored.unwrap_or_else(|| object.uid().clone());
            let result = match operation {
                Operation::Create => store.create(object),
                Operation::Update => store.update(&target, object),
                Operation::Delete => store.delete(&object.object_type(), &target),
            };

            match result {
                Ok(()) => outcomes.push((index, CommitOutcome::Written(operation))),
                Err(err) => {
                    tracing::warn!(index, error = %err, "object could not be persisted");
                    let identifier = object_identifier(id_scheme, object);
                    outcomes.push((
                        index,
                        CommitOutcome::Failed(err.to_error_report(id_scheme, &identifier)),
                    ));
                    if atomic {
                        rolled_back = true;
                        halted = true;
                    }
                }
            }
        }

        if rolled_back {
            tracing::warn!("rolling back import batch");
            store.rollback();
        } else {
            store.commit();
        }

        outcomes.sort_by_key(|(index, _)| *index);

        let mut commit = CommitReport::new();
        let mut written = Vec::new();
        let mut failed = false;
        for (index, outcome) in outcomes {
            let object = &objects[index];
            let mut type_report = TypeReport::new(object.object_type());
            match outcome {
                CommitOutcome::Written(operation) if !rolled_back => {
                    let stats = type_report.stats_mut();
                    match operation {
                        Operation::Create => stats.inc_created(),
                        Operation::Update => stats.inc_updated(),
                        Operation::Delete => stats.inc_deleted(),
                    }
                    if operation != Operation::Delete {
                        written.push(index);
                    }
                }
                CommitOutcome::Written(_) | CommitOutcome::NotScheduled => {
                    type_report.stats_mut().inc_ignored();
                }
                CommitOutcome::Failed(error) => {
                    failed = true;
                    let mut object_report =
                        ObjectReport::new(object.object_type(), index, Some(object.uid().clone()));
                    object_report.add_error_report(error);
                    type_report.add_object_report(object_report);
                    type_report.stats_mut().inc_ignored();
                }
            }
            commit.add_type_report(type_report);
        }

        commit.set_status(phase_status(failed, false, atomic));
        (commit, rolled_back, written)
    }

    /// Hands notification effects of written records to the dispatcher
    fn notify(
        &self,
        dispatcher: &mut dyn NotificationDispatcher,
        effects: &RuleEngineEffects,
        objects: &[BundleObject],
        written: &[usize],
    ) {
        if effects.is_empty() {
            return;
        }
        let mut dispatched = 0usize;
        for &index in written {
            let object = &objects[index];
            let kind = match object {
                BundleObject::Enrollment(_) => RecordKind::Enrollment,
                BundleObject::Event(_) => RecordKind::Event,
                _ => continue,
            };
            for effect in effects.notification_effects(kind, object.uid()) {
                dispatcher.dispatch(effect);
                dispatched += 1;
            }
        }
        tracing::debug!(dispatched, "notifications handed to dispatcher");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_phase_status() {
        assert_eq!(phase_status(true, false, true), ImportStatus::Error);
        assert_eq!(phase_status(true, false, false), ImportStatus::Warning);
        assert_eq!(phase_status(false, true, true), ImportStatus::Warning);
        assert_eq!(phase_status(false, false, true), ImportStatus::Ok);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PipelineState::Committed.to_string(), "COMMITTED");
        assert_eq!(PipelineState::Aborted.as_str(), "ABORTED");
    }

    #[test]
    fn test_reference_names() {
        assert_eq!(reference_name(&ObjectType::tracked_entity()), "trackedEntity");
        assert_eq!(reference_name(&ObjectType::enrollment()), "enrollment");
        assert_eq!(reference_name(&ObjectType::relationship()), "RELATIONSHIP");
    }
}
