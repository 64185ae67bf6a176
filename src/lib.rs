#![forbid(unsafe_code)]

//! tracker-import: validate-then-commit import of tracker bundles
//!
//! Bundles of tracked entities, enrollments, events and metadata objects are
//! validated as a batch, checked against configurable program rules and then
//! committed through a persistence collaborator. Every outcome is collected in
//! a single [`ImportReport`](report::ImportReport).

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod import;
pub mod output;
pub mod report;
pub mod rules;
pub mod types;

// Re-export error types for convenient access
pub use error::{ConfigError, ImportError, PersistenceError, RuleError};

// Re-export core domain types for convenient access
pub use types::{ImportStatus, ObjectType, Severity, Uid};
