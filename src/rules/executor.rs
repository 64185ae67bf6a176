//! Executors turning validation effects into issues on tracked records
//!
//! Each executor handles exactly one validation action type. An invocation
//! first checks [`RuleActionExecutor::needs_to_run`]; only when that gate
//! passes is [`RuleActionExecutor::execute`] called, yielding at most one
//! [`Issue`].

use crate::error::RuleError;
use crate::report::{ErrorCode, ErrorReport};
use crate::rules::action::RuleActionType;
use crate::rules::context::{BundleContext, TrackedRecord};
use crate::rules::effects::ValidationEffect;
use crate::types::{Severity, Uid};
use std::collections::BTreeMap;

/// A problem raised by a rule on one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub rule_uid: Uid,
    pub code: ErrorCode,
    pub issue_type: Severity,
    pub args: Vec<String>,
}

impl Issue {
    pub fn new(
        rule_uid: &Uid,
        code: ErrorCode,
        issue_type: Severity,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Issue {
            rule_uid: rule_uid.clone(),
            code,
            issue_type,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.issue_type == Severity::Error
    }

    /// Converts the issue into a report entry against the record
    pub fn to_error_report(&self, record: &TrackedRecord) -> ErrorReport {
        ErrorReport::with_severity(
            self.code,
            record.object_type(),
            self.args.iter().cloned(),
            self.issue_type,
        )
    }
}

/// Executor for one validation action type
pub trait RuleActionExecutor: Send + Sync {
    fn action_type(&self) -> RuleActionType;

    /// Severity of the issues this executor raises by default
    ///
    /// An executor may escalate one specific outcome to an error; ASSIGN does
    /// so for a value it is not allowed to overwrite.
    fn issue_type(&self) -> Severity;

    /// Gate checked before `execute`; most executors always run
    fn needs_to_run(&self, _record: &TrackedRecord) -> bool {
        true
    }

    fn execute(
        &self,
        bundle: &BundleContext,
        effect: &ValidationEffect,
        record: &TrackedRecord,
    ) -> Option<Issue>;

    /// Checks the gate, then executes
    fn run(
        &self,
        bundle: &BundleContext,
        effect: &ValidationEffect,
        record: &TrackedRecord,
    ) -> Option<Issue> {
        if !self.needs_to_run(record) {
            return None;
        }
        self.execute(bundle, effect, record)
    }
}

fn message_issue(effect: &ValidationEffect, issue_type: Severity) -> Issue {
    Issue::new(
        &effect.rule_uid,
        ErrorCode::E1300,
        issue_type,
        [effect.rule_uid.to_string(), effect.message()],
    )
}

pub struct ShowWarningExecutor;

impl RuleActionExecutor for ShowWarningExecutor {
    fn action_type(&self) -> RuleActionType {
        RuleActionType::ShowWarning
    }

    fn issue_type(&self) -> Severity {
        Severity::Warning
    }

    fn execute(&self, _: &BundleContext, effect: &ValidationEffect, _: &TrackedRecord) -> Option<Issue> {
        Some(message_issue(effect, self.issue_type()))
    }
}

pub struct ShowErrorExecutor;

impl RuleActionExecutor for ShowErrorExecutor {
    fn action_type(&self) -> RuleActionType {
        RuleActionType::ShowError
    }

    fn issue_type(&self) -> Severity {
        Severity::Error
    }

    fn execute(&self, _: &BundleContext, effect: &ValidationEffect, _: &TrackedRecord) -> Option<Issue> {
        Some(message_issue(effect, self.issue_type()))
    }
}

/// Warning raised only when the record is being completed
pub struct WarningOnCompleteExecutor;

impl RuleActionExecutor for WarningOnCompleteExecutor {
    fn action_type(&self) -> RuleActionType {
        RuleActionType::WarningOnComplete
    }

    fn issue_type(&self) -> Severity {
        Severity::Warning
    }

    fn needs_to_run(&self, record: &TrackedRecord) -> bool {
        record.is_completed()
    }

    fn execute(&self, _: &BundleContext, effect: &ValidationEffect, _: &TrackedRecord) -> Option<Issue> {
        Some(message_issue(effect, self.issue_type()))
    }
}

/// Error raised only when the record is being completed
pub struct ErrorOnCompleteExecutor;

impl RuleActionExecutor for ErrorOnCompleteExecutor {
    fn action_type(&self) -> RuleActionType {
        RuleActionType::ErrorOnComplete
    }

    fn issue_type(&self) -> Severity {
        Severity::Error
    }

    fn needs_to_run(&self, record: &TrackedRecord) -> bool {
        record.is_completed()
    }

    fn execute(&self, _: &BundleContext, effect: &ValidationEffect, _: &TrackedRecord) -> Option<Issue> {
        Some(message_issue(effect, self.issue_type()))
    }
}

/// Requires the target attribute (enrollments) or data element (events)
pub struct SetMandatoryFieldExecutor;

impl RuleActionExecutor for SetMandatoryFieldExecutor {
    fn action_type(&self) -> RuleActionType {
        RuleActionType::SetMandatoryField
    }

    fn issue_type(&self) -> Severity {
        Severity::Error
    }

    fn execute(
        &self,
        bundle: &BundleContext,
        effect: &ValidationEffect,
        record: &TrackedRecord,
    ) -> Option<Issue> {
        let field = effect.field.as_ref()?;
        let (value, code) = match record {
            TrackedRecord::Enrollment(_) => (
                bundle
                    .attribute(record, field)
                    .and_then(|attribute| attribute.value.as_deref()),
                ErrorCode::E1306,
            ),
            TrackedRecord::Event(_) => (record.data_value(field), ErrorCode::E1301),
        };

        match value {
            Some(value) if !value.trim().is_empty() => None,
            _ => Some(Issue::new(
                &effect.rule_uid,
                code,
                self.issue_type(),
                [effect.rule_uid.to_string(), field.to_string()],
            )),
        }
    }
}

/// Reports how a calculated value will be assigned to its target field
///
/// Assigning into an empty or equal field, or any field when overwriting is
/// enabled, is a warning (`issue_type`). A differing value that may not be
/// overwritten is escalated to [`AssignValueExecutor::CONFLICT_SEVERITY`].
pub struct AssignValueExecutor;

impl AssignValueExecutor {
    pub const CONFLICT_SEVERITY: Severity = Severity::Error;
}

impl RuleActionExecutor for AssignValueExecutor {
    fn action_type(&self) -> RuleActionType {
        RuleActionType::Assign
    }

    fn issue_type(&self) -> Severity {
        Severity::Warning
    }

    fn execute(
        &self,
        bundle: &BundleContext,
        effect: &ValidationEffect,
        record: &TrackedRecord,
    ) -> Option<Issue> {
        let field = effect.field.as_ref()?;
        let calculated = effect.data.as_deref().unwrap_or_default();
        let (current, replace_code, conflict_code) = match record {
            TrackedRecord::Enrollment(_) => (
                bundle
                    .attribute(record, field)
                    .and_then(|attribute| attribute.value.as_deref()),
                ErrorCode::E1310,
                ErrorCode::E1309,
            ),
            TrackedRecord::Event(_) => (record.data_value(field), ErrorCode::E1308, ErrorCode::E1307),
        };

        let assignable = match current {
            None => true,
            Some(current) => {
                current.is_empty() || current == calculated || bundle.assign_overwrite()
            }
        };

        let issue = if assignable {
            Issue::new(
                &effect.rule_uid,
                replace_code,
                self.issue_type(),
                [
                    effect.rule_uid.to_string(),
                    field.to_string(),
                    record.uid().to_string(),
                ],
            )
        } else {
            Issue::new(
                &effect.rule_uid,
                conflict_code,
                Self::CONFLICT_SEVERITY,
                [
                    effect.rule_uid.to_string(),
                    field.to_string(),
                    calculated.to_string(),
                ],
            )
        };
        Some(issue)
    }
}

/// One executor per validation action type
pub fn default_executors() -> Vec<Box<dyn RuleActionExecutor>> {
    vec![
        Box::new(ShowWarningExecutor),
        Box::new(ShowErrorExecutor),
        Box::new(WarningOnCompleteExecutor),
        Box::new(ErrorOnCompleteExecutor),
        Box::new(SetMandatoryFieldExecutor),
        Box::new(AssignValueExecutor),
    ]
}

/// Lookup table from validation action type to executor
pub struct ExecutorRegistry {
    executors: BTreeMap<RuleActionType, Box<dyn RuleActionExecutor>>,
}

impl ExecutorRegistry {
    /// Builds the table from the supplied executors
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidDefinition` if an executor is supplied for a
    /// non-validation action type, two executors claim the same type, or a
    /// validation action type is left without an executor.
    pub fn new(executors: Vec<Box<dyn RuleActionExecutor>>) -> Result<Self, RuleError> {
        let mut table = BTreeMap::new();
        for executor in executors {
            let action_type = executor.action_type();
            if !action_type.is_validation() {
                return Err(RuleError::InvalidDefinition(format!(
                    "Executor registered for non-validation action type {}",
                    action_type
                )));
            }
            if table.insert(action_type, executor).is_some() {
                return Err(RuleError::InvalidDefinition(format!(
                    "Duplicate executor for action type {}",
                    action_type
                )));
            }
        }
        if let Some(missing) = RuleActionType::ALL
            .into_iter()
            .find(|action_type| action_type.is_validation() && !table.contains_key(action_type))
        {
            return Err(RuleError::InvalidDefinition(format!(
                "No executor registered for action type {}",
                missing
            )));
        }
        Ok(Self { executors: table })
    }

    pub fn with_defaults() -> Result<Self, RuleError> {
        Self::new(default_executors())
    }

    pub fn executor_for(&self, action_type: RuleActionType) -> Option<&dyn RuleActionExecutor> {
        self.executors.get(&action_type).map(|executor| executor.as_ref())
    }

    /// Runs every effect of a record through its executor, in effect order
    ///
    /// Every validation action type has an executor, so only effects of
    /// other classes fall through.
    pub fn execute_all(
        &self,
        bundle: &BundleContext,
        effects: &[ValidationEffect],
        record: &TrackedRecord,
    ) -> Vec<Issue> {
        effects
            .iter()
            .filter_map(|effect| {
                self.executor_for(effect.action_type)
                    .and_then(|executor| executor.run(bundle, effect, record))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}
