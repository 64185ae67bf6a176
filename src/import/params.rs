//! Import parameters controlling validation and commit behaviour

use crate::types::ObjectType;
use serde::{Deserialize, Serialize};

/// What the import does with each submitted object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportMode {
    Create,
    Update,
    #[default]
    CreateAndUpdate,
    Delete,
}

/// Whether one failing object fails the whole batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtomicMode {
    #[default]
    AllOrNothing,
    Object,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationMode {
    /// Run every validator over every object
    #[default]
    Full,
    /// Stop validating at the first error
    FailFast,
    /// Skip structural validators; rule effects are still enforced
    Skip,
}

/// Which identifier is used to match submitted objects to stored ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdScheme {
    #[default]
    Uid,
    Code,
}

impl IdScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdScheme::Uid => "UID",
            IdScheme::Code => "CODE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleMode {
    #[default]
    Commit,
    /// Validate only; nothing is persisted
    Validate,
}

/// The per-object write resolved from the import mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl ImportMode {
    /// Resolves the write for an object given whether it already exists
    pub fn operation(&self, exists: bool) -> Operation {
        match self {
            ImportMode::Create => Operation::Create,
            ImportMode::Update => Operation::Update,
            ImportMode::CreateAndUpdate if exists => Operation::Update,
            ImportMode::CreateAndUpdate => Operation::Create,
            ImportMode::Delete => Operation::Delete,
        }
    }
}

/// Everything the pipeline needs to know about one import call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportParams {
    pub import_mode: ImportMode,
    pub atomic_mode: AtomicMode,
    pub validation_mode: ValidationMode,
    pub id_scheme: IdScheme,
    pub bundle_mode: BundleMode,
    /// Let ASSIGN replace values that differ from the calculated one
    pub assign_overwrite: bool,
    pub skip_rule_engine: bool,
    /// Name reported in access errors
    pub username: String,
    /// Object types the importing user may not write
    pub protected_types: Vec<ObjectType>,
}

impl Default for ImportParams {
    fn default() -> Self {
        ImportParams {
            import_mode: ImportMode::default(),
            atomic_mode: AtomicMode::default(),
            validation_mode: ValidationMode::default(),
            id_scheme: IdScheme::default(),
            bundle_mode: BundleMode::default(),
            assign_overwrite: false,
            skip_rule_engine: false,
            username: "system".to_string(),
            protected_types: Vec::new(),
        }
    }
}

impl ImportParams {
    pub fn validate_only(&self) -> bool {
        self.bundle_mode == BundleMode::Validate
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic_mode == AtomicMode::AllOrNothing
    }

    pub fn is_protected(&self, object_type: &ObjectType) -> bool {
        self.protected_types.contains(object_type)
    }
}
