#![forbid(unsafe_code)]

//! Program rules: action types, validators, executors and effects

pub mod action;
pub mod condition;
pub mod context;
pub mod effects;
pub mod executor;
pub mod registry;
pub mod validator;

// Re-export core types
pub use action::{EffectClass, ProgramRule, RuleAction, RuleActionType, RuleScope};
pub use condition::Condition;
pub use context::{BundleContext, TrackedRecord};
pub use effects::{
    NotificationEffect, RecordKind, RuleEffect, RuleEffects, RuleEngineEffects, ValidationEffect,
};
pub use executor::{ExecutorRegistry, Issue, RuleActionExecutor};
pub use registry::ValidatorRegistry;
pub use validator::{RuleActionValidator, RuleMetadata, ValidatorKind};
