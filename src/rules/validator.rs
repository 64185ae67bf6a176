//! Structural validation of rule actions against the metadata catalog
//!
//! Validators are organised by capability rather than by action type: several
//! action types that need the same checks share one implementation.

use crate::report::{ErrorCode, ErrorReport};
use crate::rules::action::{ProgramRule, RuleAction};
use crate::types::{ObjectType, Uid};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Validator capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ValidatorKind {
    AlwaysValid,
    FieldTarget,
    AssignValue,
    Section,
    ProgramStage,
    OptionTarget,
    OptionGroup,
    Notification,
}

impl ValidatorKind {
    pub const ALL: [ValidatorKind; 8] = [
        ValidatorKind::AlwaysValid,
        ValidatorKind::FieldTarget,
        ValidatorKind::AssignValue,
        ValidatorKind::Section,
        ValidatorKind::ProgramStage,
        ValidatorKind::OptionTarget,
        ValidatorKind::OptionGroup,
        ValidatorKind::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorKind::AlwaysValid => "AlwaysValid",
            ValidatorKind::FieldTarget => "FieldTarget",
            ValidatorKind::AssignValue => "AssignValue",
            ValidatorKind::Section => "Section",
            ValidatorKind::ProgramStage => "ProgramStage",
            ValidatorKind::OptionTarget => "Option",
            ValidatorKind::OptionGroup => "OptionGroup",
            ValidatorKind::Notification => "Notification",
        }
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known metadata identifiers that rule actions may reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleMetadata {
    pub data_elements: HashSet<Uid>,
    pub attributes: HashSet<Uid>,
    pub sections: HashSet<Uid>,
    pub program_stages: HashSet<Uid>,
    pub options: HashSet<Uid>,
    pub option_groups: HashSet<Uid>,
    pub templates: HashSet<Uid>,
}

/// Checks that a single rule action is usable before it is allowed to run
///
/// Implementations are `Send + Sync` so a registry can be shared across
/// rule evaluation workers.
pub trait RuleActionValidator: Send + Sync {
    /// The capability this validator provides
    fn kind(&self) -> ValidatorKind;

    /// Returns one error report per problem found, or an empty vector
    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport>;
}

fn report(code: ErrorCode, args: [&str; 2]) -> ErrorReport {
    ErrorReport::new(code, ObjectType::program_rule_action(), args)
}

fn missing(code: ErrorCode, rule: &ProgramRule, action: &RuleAction) -> ErrorReport {
    report(code, [action.action_type.as_str(), rule.uid.as_str()])
}

fn unknown(code: ErrorCode, uid: &Uid, rule: &ProgramRule) -> ErrorReport {
    report(code, [uid.as_str(), rule.uid.as_str()])
}

/// Checks a required reference: missing yields `missing_code`, a reference
/// outside `known` yields `unknown_code`
fn check_reference(
    reference: Option<&Uid>,
    known: &HashSet<Uid>,
    missing_code: ErrorCode,
    unknown_code: ErrorCode,
    rule: &ProgramRule,
    action: &RuleAction,
) -> Vec<ErrorReport> {
    match reference {
        None => vec![missing(missing_code, rule, action)],
        Some(uid) if !known.contains(uid) => vec![unknown(unknown_code, uid, rule)],
        Some(_) => Vec::new(),
    }
}

/// Checks whichever field target is present against the catalog
fn check_field(rule: &ProgramRule, action: &RuleAction, metadata: &RuleMetadata) -> Vec<ErrorReport> {
    let mut reports = Vec::new();
    if let Some(data_element) = &action.data_element
        && !metadata.data_elements.contains(data_element)
    {
        reports.push(unknown(ErrorCode::E4034, data_element, rule));
    }
    if let Some(attribute) = &action.attribute
        && !metadata.attributes.contains(attribute)
    {
        reports.push(unknown(ErrorCode::E4035, attribute, rule));
    }
    reports
}

/// Actions with nothing to check
pub struct AlwaysValidValidator;

impl RuleActionValidator for AlwaysValidValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::AlwaysValid
    }

    fn validate(&self, _: &ProgramRule, _: &RuleAction, _: &RuleMetadata) -> Vec<ErrorReport> {
        Vec::new()
    }
}

/// Actions that must target an existing data element or attribute
pub struct FieldTargetValidator;

impl RuleActionValidator for FieldTargetValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::FieldTarget
    }

    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport> {
        if action.field().is_none() {
            return vec![missing(ErrorCode::E4033, rule, action)];
        }
        check_field(rule, action, metadata)
    }
}

/// ASSIGN needs a destination (field or content variable) and data
pub struct AssignValueValidator;

impl RuleActionValidator for AssignValueValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::AssignValue
    }

    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport> {
        let mut reports = Vec::new();
        if action.field().is_none() && action.content.as_deref().is_none_or(str::is_empty) {
            reports.push(missing(ErrorCode::E4046, rule, action));
        }
        if action.data.as_deref().is_none_or(|data| data.trim().is_empty()) {
            reports.push(missing(ErrorCode::E4047, rule, action));
        }
        reports.extend(check_field(rule, action, metadata));
        reports
    }
}

pub struct SectionValidator;

impl RuleActionValidator for SectionValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Section
    }

    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport> {
        check_reference(
            action.section.as_ref(),
            &metadata.sections,
            ErrorCode::E4036,
            ErrorCode::E4037,
            rule,
            action,
        )
    }
}

pub struct ProgramStageValidator;

impl RuleActionValidator for ProgramStageValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::ProgramStage
    }

    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport> {
        check_reference(
            action.program_stage.as_ref(),
            &metadata.program_stages,
            ErrorCode::E4038,
            ErrorCode::E4039,
            rule,
            action,
        )
    }
}

/// HIDEOPTION needs the option and the field it is hidden on
pub struct OptionValidator;

impl RuleActionValidator for OptionValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::OptionTarget
    }

    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport> {
        let mut reports = check_reference(
            action.option.as_ref(),
            &metadata.options,
            ErrorCode::E4040,
            ErrorCode::E4041,
            rule,
            action,
        );
        if action.field().is_none() {
            reports.push(missing(ErrorCode::E4033, rule, action));
        } else {
            reports.extend(check_field(rule, action, metadata));
        }
        reports
    }
}

pub struct OptionGroupValidator;

impl RuleActionValidator for OptionGroupValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::OptionGroup
    }

    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport> {
        check_reference(
            action.option_group.as_ref(),
            &metadata.option_groups,
            ErrorCode::E4042,
            ErrorCode::E4043,
            rule,
            action,
        )
    }
}

pub struct NotificationValidator;

impl RuleActionValidator for NotificationValidator {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Notification
    }

    fn validate(
        &self,
        rule: &ProgramRule,
        action: &RuleAction,
        metadata: &RuleMetadata,
    ) -> Vec<ErrorReport> {
        check_reference(
            action.template.as_ref(),
            &metadata.templates,
            ErrorCode::E4044,
            ErrorCode::E4045,
            rule,
            action,
        )
    }
}

/// One validator per capability
pub fn default_validators() -> Vec<Box<dyn RuleActionValidator>> {
    vec![
        Box::new(AlwaysValidValidator),
        Box::new(FieldTargetValidator),
        Box::new(AssignValueValidator),
        Box::new(SectionValidator),
        Box::new(ProgramStageValidator),
        Box::new(OptionValidator),
        Box::new(OptionGroupValidator),
        Box::new(NotificationValidator),
    ]
}
