#![forbid(unsafe_code)]

//! Core domain types for the import pipeline
//!
//! This module defines the fundamental identifiers and enums shared by the
//! report model, the rule engine and the pipeline.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static UID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9]{10}$").expect("uid pattern is a valid regex")
});

/// Identifier of a domain object
///
/// Any string is accepted so that malformed identifiers in a submitted bundle
/// can be reported against the object instead of failing deserialization.
/// Use [`Uid::is_valid`] to check the canonical 11-character format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Creates a new Uid without format checks
    pub fn new(uid: impl Into<String>) -> Self {
        Uid(uid.into())
    }

    /// Creates a Uid, returning None unless it matches the canonical format
    pub fn parse(uid: impl Into<String>) -> Option<Self> {
        let uid = Uid(uid.into());
        uid.is_valid().then_some(uid)
    }

    /// Returns true if the uid is 11 alphanumeric characters starting with a letter
    pub fn is_valid(&self) -> bool {
        UID_PATTERN.is_match(&self.0)
    }

    /// Returns the uid as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Uid {
    fn from(uid: &str) -> Self {
        Uid::new(uid)
    }
}

impl From<String> for Uid {
    fn from(uid: String) -> Self {
        Uid(uid)
    }
}

/// The type key under which reports are aggregated
///
/// Tracker objects use the well-known constructors below; metadata objects
/// carry their schema name (for example `DATA_ELEMENT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectType(String);

impl ObjectType {
    /// Creates an ObjectType, normalizing to upper snake case
    ///
    /// Returns None if the name is empty or contains characters other than
    /// alphanumerics, `_` and `-`.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return None;
        }
        Some(ObjectType(name.to_ascii_uppercase().replace('-', "_")))
    }

    pub fn tracked_entity() -> Self {
        ObjectType("TRACKED_ENTITY".to_string())
    }

    pub fn enrollment() -> Self {
        ObjectType("ENROLLMENT".to_string())
    }

    pub fn event() -> Self {
        ObjectType("EVENT".to_string())
    }

    pub fn relationship() -> Self {
        ObjectType("RELATIONSHIP".to_string())
    }

    pub fn program_rule_action() -> Self {
        ObjectType("PROGRAM_RULE_ACTION".to_string())
    }

    /// Returns the object type as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ObjectType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectType::new(value.clone()).ok_or_else(|| format!("Invalid object type '{}'", value))
    }
}

impl From<ObjectType> for String {
    fn from(object_type: ObjectType) -> Self {
        object_type.0
    }
}

/// Severity of an error report or rule issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Overall status of a validation, commit or import report
///
/// Variants are ordered from best to worst so phase statuses combine with `max`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportStatus {
    #[default]
    Ok,
    Warning,
    Error,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Ok => "OK",
            ImportStatus::Warning => "WARNING",
            ImportStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_format() {
        assert!(Uid::new("DiszpKrYNg8").is_valid());
        assert!(Uid::new("a1234567890").is_valid());
        assert!(!Uid::new("").is_valid());
        assert!(!Uid::new("1iszpKrYNg8").is_valid());
        assert!(!Uid::new("DiszpKrYNg").is_valid());
        assert!(!Uid::new("DiszpKrYNg8x").is_valid());
        assert!(!Uid::new("Diszp-rYNg8").is_valid());
    }

    #[test]
    fn test_uid_parse() {
        assert!(Uid::parse("DiszpKrYNg8").is_some());
        assert!(Uid::parse("not a uid").is_none());
    }

    #[test]
    fn test_object_type_normalization() {
        assert_eq!(ObjectType::new("dataElement").unwrap().as_str(), "DATAELEMENT");
        assert_eq!(ObjectType::new("data-element").unwrap().as_str(), "DATA_ELEMENT");
        assert_eq!(ObjectType::new("EVENT").unwrap(), ObjectType::event());
        assert!(ObjectType::new("").is_none());
        assert!(ObjectType::new("bad type").is_none());
    }

    #[test]
    fn test_object_type_serde() {
        let json = serde_json::to_string(&ObjectType::enrollment()).unwrap();
        assert_eq!(json, "\"ENROLLMENT\"");
        let parsed: ObjectType = serde_json::from_str("\"tracked_entity\"").unwrap();
        assert_eq!(parsed, ObjectType::tracked_entity());
        assert!(serde_json::from_str::<ObjectType>("\"bad type\"").is_err());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&ImportStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&ImportStatus::Warning).unwrap(),
            "\"WARNING\""
        );
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn test_status_ordering() {
        assert!(ImportStatus::Ok < ImportStatus::Warning);
        assert_eq!(ImportStatus::Warning.max(ImportStatus::Error), ImportStatus::Error);
    }
}
