//! Registry mapping rule action types to their validators
//!
//! The ValidatorRegistry is responsible for:
//! - Building the action type -> validator table once at startup
//! - Failing fast when a required validator capability was not supplied
//! - Validating configured program rules against the metadata catalog

use crate::error::RuleError;
use crate::report::ErrorReport;
use crate::rules::action::{ProgramRule, RuleActionType};
use crate::rules::validator::{
    RuleActionValidator, RuleMetadata, ValidatorKind, default_validators,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Lookup table from action type to the validator responsible for it
///
/// Action types that share a capability share the same validator instance.
pub struct ValidatorRegistry {
    validators: BTreeMap<RuleActionType, Arc<dyn RuleActionValidator>>,
}

impl ValidatorRegistry {
    /// Builds a registry covering every known action type
    ///
    /// # Errors
    ///
    /// Returns `RuleError::MissingValidator` if an action type needs a
    /// capability that is not among `validators`.
    pub fn new(validators: Vec<Box<dyn RuleActionValidator>>) -> Result<Self, RuleError> {
        Self::for_types(validators, &RuleActionType::ALL)
    }

    /// Builds a registry covering only the given action types
    ///
    /// # Arguments
    ///
    /// * `validators` - One implementation per capability; later duplicates win
    /// * `action_types` - The action types to register
    ///
    /// # Errors
    ///
    /// Returns `RuleError::MissingValidator` for the first action type whose
    /// capability was not supplied.
    pub fn for_types(
        validators: Vec<Box<dyn RuleActionValidator>>,
        action_types: &[RuleActionType],
    ) -> Result<Self, RuleError> {
        let by_kind: HashMap<ValidatorKind, Arc<dyn RuleActionValidator>> = validators
            .into_iter()
            .map(|validator| (validator.kind(), Arc::from(validator)))
            .collect();

        let mut table = BTreeMap::new();
        for &action_type in action_types {
            let kind = action_type.validator_kind();
            let validator = by_kind
                .get(&kind)
                .ok_or(RuleError::MissingValidator { kind, action_type })?;
            table.insert(action_type, Arc::clone(validator));
        }

        tracing::debug!(
            action_types = table.len(),
            capabilities = by_kind.len(),
            "built rule action validator registry"
        );

        Ok(Self { validators: table })
    }

    /// Registry built from the default validator for every capability
    pub fn with_defaults() -> Result<Self, RuleError> {
        Self::new(default_validators())
    }

    /// Returns the validator for an action type
    ///
    /// # Errors
    ///
    /// Returns `RuleError::UnregisteredActionType` if the type was never registered.
    pub fn validator_for(
        &self,
        action_type: RuleActionType,
    ) -> Result<&dyn RuleActionValidator, RuleError> {
        self.validators
            .get(&action_type)
            .map(|validator| validator.as_ref())
            .ok_or(RuleError::UnregisteredActionType(action_type))
    }

    /// Runs every action of every rule through its validator
    ///
    /// Returns all error reports found, in rule and action order.
    pub fn validate_rules(
        &self,
        rules: &[ProgramRule],
        metadata: &RuleMetadata,
    ) -> Result<Vec<ErrorReport>, RuleError> {
        let mut reports = Vec::new();
        for rule in rules {
            for action in &rule.actions {
                let validator = self.validator_for(action.action_type)?;
                reports.extend(validator.validate(rule, action, metadata));
            }
        }
        Ok(reports)
    }

    /// Like [`validate_rules`](Self::validate_rules) but fails on the first problem
    ///
    /// Used at startup: a rule that cannot run is a broken deployment.
    pub fn ensure_valid(&self, rules: &[ProgramRule], metadata: &RuleMetadata) -> Result<(), RuleError> {
        for rule in rules {
            for action in &rule.actions {
                let validator = self.validator_for(action.action_type)?;
                if let Some(report) = validator.validate(rule, action, metadata).into_iter().next() {
                    return Err(RuleError::InvalidAction {
                        rule: rule.uid.clone(),
                        action_type: action.action_type,
                        message: format!("{}: {}", report.error_code, report.message),
                    });
                }
            }
        }
        Ok(())
    }

    /// Iterates over registered action types and their capabilities
    pub fn iter(&self) -> impl Iterator<Item = (RuleActionType, ValidatorKind)> + '_ {
        self.validators
            .iter()
            .map(|(action_type, validator)| (*action_type, validator.kind()))
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
