//! Stable error codes and the error report carrying them
//!
//! Codes are part of the external contract: downstream tooling matches on the
//! `E....` strings, so existing codes must never be renumbered.

use crate::types::{ObjectType, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error code vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCode {
    // Tracker references and commit failures
    E1033,
    E1063,
    E1130,

    // Generated by program rules
    E1300,
    E1301,
    E1306,
    E1307,
    E1308,
    E1309,
    E1310,

    // Access policy
    E3000,
    E3001,
    E3002,

    // Object structure
    E4000,
    E4014,
    E4030,

    // Program rule action configuration
    E4033,
    E4034,
    E4035,
    E4036,
    E4037,
    E4038,
    E4039,
    E4040,
    E4041,
    E4042,
    E4043,
    E4044,
    E4045,
    E4046,
    E4047,

    // References and uniqueness
    E5000,
    E5001,
    E5003,
    E5005,
}

impl ErrorCode {
    /// Returns the code as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1033 => "E1033",
            ErrorCode::E1063 => "E1063",
            ErrorCode::E1130 => "E1130",
            ErrorCode::E1300 => "E1300",
            ErrorCode::E1301 => "E1301",
            ErrorCode::E1306 => "E1306",
            ErrorCode::E1307 => "E1307",
            ErrorCode::E1308 => "E1308",
            ErrorCode::E1309 => "E1309",
            ErrorCode::E1310 => "E1310",
            ErrorCode::E3000 => "E3000",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E4000 => "E4000",
            ErrorCode::E4014 => "E4014",
            ErrorCode::E4030 => "E4030",
            ErrorCode::E4033 => "E4033",
            ErrorCode::E4034 => "E4034",
            ErrorCode::E4035 => "E4035",
            ErrorCode::E4036 => "E4036",
            ErrorCode::E4037 => "E4037",
            ErrorCode::E4038 => "E4038",
            ErrorCode::E4039 => "E4039",
            ErrorCode::E4040 => "E4040",
            ErrorCode::E4041 => "E4041",
            ErrorCode::E4042 => "E4042",
            ErrorCode::E4043 => "E4043",
            ErrorCode::E4044 => "E4044",
            ErrorCode::E4045 => "E4045",
            ErrorCode::E4046 => "E4046",
            ErrorCode::E4047 => "E4047",
            ErrorCode::E5000 => "E5000",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5003 => "E5003",
            ErrorCode::E5005 => "E5005",
        }
    }

    /// Message template with positional `{n}` placeholders
    pub fn template(&self) -> &'static str {
        match self {
            ErrorCode::E1033 => "Event `{0}`: enrollment `{1}` does not exist",
            ErrorCode::E1063 => "Enrollment `{0}`: tracked entity `{1}` does not exist",
            ErrorCode::E1130 => "{0} `{1}` could not be persisted: {2}",
            ErrorCode::E1300 => "Generated by program rule (`{0}`) - `{1}`",
            ErrorCode::E1301 => {
                "Generated by program rule (`{0}`) - Mandatory DataElement `{1}` is not present"
            }
            ErrorCode::E1306 => {
                "Generated by program rule (`{0}`) - Mandatory Attribute `{1}` is not present"
            }
            ErrorCode::E1307 => {
                "Generated by program rule (`{0}`) - Unable to assign value to data element `{1}`. The provided value must be empty or match the calculated value `{2}`"
            }
            ErrorCode::E1308 => {
                "Generated by program rule (`{0}`) - DataElement `{1}` is being replaced in event `{2}`"
            }
            ErrorCode::E1309 => {
                "Generated by program rule (`{0}`) - Unable to assign value to attribute `{1}`. The provided value must be empty or match the calculated value `{2}`"
            }
            ErrorCode::E1310 => {
                "Generated by program rule (`{0}`) - Attribute `{1}` is being replaced in enrollment `{2}`"
            }
            ErrorCode::E3000 => "User `{0}` is not allowed to create objects of type {1}",
            ErrorCode::E3001 => "User `{0}` is not allowed to update object `{1}`",
            ErrorCode::E3002 => "User `{0}` is not allowed to delete object `{1}`",
            ErrorCode::E4000 => "Missing required property `{0}`",
            ErrorCode::E4014 => "Invalid UID `{0}` for property `{1}`",
            ErrorCode::E4030 => {
                "Object could not be deleted because it is associated with another object: {0}"
            }
            ErrorCode::E4033 => {
                "Program rule action of type `{0}` in program rule `{1}` must have a data element or attribute"
            }
            ErrorCode::E4034 => "Data element `{0}` referenced by program rule `{1}` does not exist",
            ErrorCode::E4035 => "Attribute `{0}` referenced by program rule `{1}` does not exist",
            ErrorCode::E4036 => {
                "Program rule action of type `{0}` in program rule `{1}` must have a program stage section"
            }
            ErrorCode::E4037 => {
                "Program stage section `{0}` referenced by program rule `{1}` does not exist"
            }
            ErrorCode::E4038 => {
                "Program rule action of type `{0}` in program rule `{1}` must have a program stage"
            }
            ErrorCode::E4039 => "Program stage `{0}` referenced by program rule `{1}` does not exist",
            ErrorCode::E4040 => {
                "Program rule action of type `{0}` in program rule `{1}` must have an option"
            }
            ErrorCode::E4041 => "Option `{0}` referenced by program rule `{1}` does not exist",
            ErrorCode::E4042 => {
                "Program rule action of type `{0}` in program rule `{1}` must have an option group"
            }
            ErrorCode::E4043 => "Option group `{0}` referenced by program rule `{1}` does not exist",
            ErrorCode::E4044 => {
                "Program rule action of type `{0}` in program rule `{1}` must have a notification template"
            }
            ErrorCode::E4045 => {
                "Notification template `{0}` referenced by program rule `{1}` does not exist"
            }
            ErrorCode::E4046 => {
                "Program rule action of type `{0}` in program rule `{1}` must have a data element, attribute or content"
            }
            ErrorCode::E4047 => {
                "Program rule action of type `{0}` in program rule `{1}` must have data to assign"
            }
            ErrorCode::E5000 => {
                "Found matching object for given reference, but import mode is CREATE. Identifier was {0}, and object was {1}"
            }
            ErrorCode::E5001 => {
                "No matching object for given reference. Identifier was {0}, and object was {1}"
            }
            ErrorCode::E5003 => {
                "Property `{0}` with value `{1}` on object {2} already exists on object {3}"
            }
            ErrorCode::E5005 => {
                "{0} `{1}` cannot be persisted because {2} `{3}` referenced by it cannot be persisted"
            }
        }
    }

    /// Renders the template with the given arguments
    ///
    /// Placeholders without a matching argument are left in place. The
    /// template is scanned once, so argument text is never substituted into.
    pub fn format(&self, args: &[String]) -> String {
        let template = self.template();
        let mut message = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let tail = &rest[open..];
            let arg = tail.find('}').and_then(|close| {
                let position: usize = tail[1..close].parse().ok()?;
                args.get(position).map(|arg| (arg, close))
            });
            match arg {
                Some((arg, close)) => {
                    message.push_str(arg);
                    rest = &tail[close + 1..];
                }
                None => {
                    message.push('{');
                    rest = &tail[1..];
                }
            }
        }
        message.push_str(rest);
        message
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem reported against an object
///
/// Identity is structural: two reports with the same code, type, arguments and
/// severity are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorReport {
    pub error_code: ErrorCode,
    pub object_type: ObjectType,
    pub args: Vec<String>,
    pub severity: Severity,
    pub message: String,
}

impl ErrorReport {
    /// Creates an error-severity report
    pub fn new(
        error_code: ErrorCode,
        object_type: ObjectType,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::with_severity(error_code, object_type, args, Severity::Error)
    }

    /// Creates a warning-severity report
    pub fn warning(
        error_code: ErrorCode,
        object_type: ObjectType,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::with_severity(error_code, object_type, args, Severity::Warning)
    }

    pub fn with_severity(
        error_code: ErrorCode,
        object_type: ObjectType,
        args: impl IntoIterator<Item = impl Into<String>>,
        severity: Severity,
    ) -> Self {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let message = error_code.format(&args);
        ErrorReport {
            error_code,
            object_type,
            args,
            severity,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_as_strings() {
        assert_eq!(serde_json::to_string(&ErrorCode::E3000).unwrap(), "\"E3000\"");
        assert_eq!(ErrorCode::E1306.as_str(), "E1306");
        assert_eq!(ErrorCode::E1130.to_string(), "E1130");
    }

    #[test]
    fn test_format_substitutes_args() {
        let message = ErrorCode::E4000.format(&["name".to_string()]);
        assert_eq!(message, "Missing required property `name`");
    }

    #[test]
    fn test_format_keeps_missing_placeholders() {
        let message = ErrorCode::E5001.format(&["UID".to_string()]);
        assert!(message.contains("Identifier was UID"));
        assert!(message.contains("{1}"));
    }

    #[test]
    fn test_format_does_not_expand_placeholders_inside_args() {
        let message = ErrorCode::E1300.format(&["{1}".to_string(), "weight {0}".to_string()]);
        assert_eq!(message, "Generated by program rule (`{1}`) - `weight {0}`");
    }

    #[test]
    fn test_structural_equality() {
        let a = ErrorReport::new(ErrorCode::E4000, ObjectType::event(), ["occurredAt"]);
        let b = ErrorReport::new(ErrorCode::E4000, ObjectType::event(), ["occurredAt"]);
        let c = ErrorReport::new(ErrorCode::E4000, ObjectType::event(), ["orgUnit"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_severity_constructors() {
        let error = ErrorReport::new(ErrorCode::E1300, ObjectType::enrollment(), ["r", "m"]);
        let warning = ErrorReport::warning(ErrorCode::E1300, ObjectType::enrollment(), ["r", "m"]);
        assert!(error.is_error());
        assert!(!warning.is_error());
        assert_ne!(error, warning);
    }
}
