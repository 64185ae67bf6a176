//! Error types for the import pipeline
//!
//! Only configuration-class failures travel as `Err` values. Validation,
//! persistence and rule-evaluation problems for individual objects are captured
//! as entries in the import report instead.

use crate::rules::RuleActionType;
use crate::rules::validator::ValidatorKind;
use crate::types::{ObjectType, Uid};

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// JSON bundle or seed file could not be parsed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// Invalid configuration value
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Rule registration errors
///
/// These indicate a broken deployment rather than bad input and are raised
/// while registries and rule sets are being built.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// An action type references a validator capability that was not supplied
    #[error("No validator implementation supplied for capability {kind} (required by {action_type})")]
    MissingValidator {
        kind: ValidatorKind,
        action_type: RuleActionType,
    },

    /// Lookup of an action type that was never registered
    #[error("Action type {0} is not registered")]
    UnregisteredActionType(RuleActionType),

    /// A rule action failed structural validation against the metadata catalog
    #[error("Invalid rule action {action_type} on rule {rule}: {message}")]
    InvalidAction {
        rule: Uid,
        action_type: RuleActionType,
        message: String,
    },

    /// Invalid rule definition
    #[error("Invalid rule definition: {0}")]
    InvalidDefinition(String),
}

/// Typed failures returned by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Object cannot be deleted while other objects reference it
    #[error("{object_type} {uid} is referenced by {referenced_by}")]
    ReferencedBy {
        object_type: ObjectType,
        uid: Uid,
        referenced_by: String,
    },

    /// Object to update or delete does not exist
    #[error("{object_type} {uid} does not exist")]
    NotFound { object_type: ObjectType, uid: Uid },

    /// Object to create already exists
    #[error("{object_type} {uid} already exists")]
    AlreadyExists { object_type: ObjectType, uid: Uid },

    /// Store rejected the write for another reason
    #[error("{object_type} {uid} rejected: {reason}")]
    Rejected {
        object_type: ObjectType,
        uid: Uid,
        reason: String,
    },
}

/// Top-level error type for the import pipeline
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rule registration error
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
