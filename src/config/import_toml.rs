//! Parsing and validation for import.toml configuration files

use crate::error::ConfigError;
use crate::import::params::ImportParams;
use crate::rules::{ProgramRule, RuleMetadata, ValidatorRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Main configuration struct for import.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Import section: version plus the import parameters
    pub import: ImportSection,

    /// Metadata catalog rule actions are validated against
    #[serde(default)]
    pub metadata: RuleMetadata,

    /// Program rules evaluated against enrollments and events
    #[serde(default)]
    pub rules: Vec<ProgramRule>,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            import: ImportSection {
                version: "1".to_string(),
                params: ImportParams::default(),
            },
            metadata: RuleMetadata::default(),
            rules: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: ImportConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn params(&self) -> &ImportParams {
        &self.import.params
    }

    /// Validate the configuration
    ///
    /// Every rule action is checked against the metadata catalog, so a
    /// configuration that loads is one whose rules can all run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.import.version != "1" {
            return Err(ConfigError::Validation(format!(
                "Unsupported configuration version '{}'. Expected '1'",
                self.import.version
            )));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !rule.uid.is_valid() {
                return Err(ConfigError::InvalidValue {
                    field: format!("rules.{}", rule.name),
                    message: format!("'{}' is not a valid uid", rule.uid),
                });
            }
            if !seen.insert(&rule.uid) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate rule uid '{}'",
                    rule.uid
                )));
            }
            if let Some(uid) = rule
                .condition
                .referenced_uids()
                .into_iter()
                .find(|uid| !uid.is_valid())
            {
                return Err(ConfigError::InvalidValue {
                    field: format!("rules.{}.condition", rule.uid),
                    message: format!("'{}' is not a valid uid", uid),
                });
            }
        }

        let registry = ValidatorRegistry::with_defaults()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        registry
            .ensure_valid(&self.rules, &self.metadata)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        Ok(())
    }
}

/// Import section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSection {
    /// Configuration version (must be "1")
    pub version: String,

    #[serde(flatten)]
    pub params: ImportParams,
}

/// Output configuration section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub color: ColorOption,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON Lines format
    Jsonl,
}

/// Color output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorOption {
    #[default]
    Auto,
    Always,
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::params::{AtomicMode, ImportMode, ValidationMode};
    use crate::rules::{Condition, RuleActionType};
    use crate::types::{ObjectType, Uid};

    const VALID_CONFIG: &str = r#"
[import]
version = "1"
import_mode = "CREATE"
atomic_mode = "OBJECT"
validation_mode = "FAIL_FAST"
assign_overwrite = true
username = "admin"
protected_types = ["RELATIONSHIP"]

[metadata]
attributes = ["w75KJ2mc4zz"]
data_elements = ["qrur9Dvnyt5"]
templates = ["Zp268JB6Ne5"]

[[rules]]
uid = "NAgjOfWMXg6"
name = "First name is mandatory"
scope = "enrollment"
condition = { type = "attribute_missing", attribute = "w75KJ2mc4zz" }

[[rules.actions]]
action_type = "SETMANDATORYFIELD"
attribute = "w75KJ2mc4zz"

[[rules]]
uid = "tO1D62oB0tq"
name = "Notify on weight"
condition = { type = "any", conditions = [{ type = "data_value_equals", data_element = "qrur9Dvnyt5", value = "0" }, { type = "status_is", status = "COMPLETED" }] }

[[rules.actions]]
action_type = "SENDMESSAGE"
template = "Zp268JB6Ne5"

[output]
format = "jsonl"
color = "never"
"#;

    #[test]
    fn test_valid_config_parsing() {
        let config = ImportConfig::parse(VALID_CONFIG).unwrap();
        let params = config.params();

        assert_eq!(params.import_mode, ImportMode::Create);
        assert_eq!(params.atomic_mode, AtomicMode::Object);
        assert_eq!(params.validation_mode, ValidationMode::FailFast);
        assert!(params.assign_overwrite);
        assert_eq!(params.username, "admin");
        assert_eq!(params.protected_types, vec![ObjectType::relationship()]);

        assert_eq!(config.rules.len(), 2);
        assert_eq!(
            config.rules[0].actions[0].action_type,
            RuleActionType::SetMandatoryField
        );
        assert!(matches!(config.rules[1].condition, Condition::Any { .. }));
        assert!(config.metadata.attributes.contains(&Uid::new("w75KJ2mc4zz")));
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.output.color, ColorOption::Never);
    }

    #[test]
    fn test_minimal_config() {
        let config = ImportConfig::parse("[import]\nversion = \"1\"\n").unwrap();
        assert_eq!(config.params(), &ImportParams::default());
        assert!(config.rules.is_empty());
        assert_eq!(config.output.format, OutputFormat::Human);
    }

    #[test]
    fn test_invalid_version() {
        let result = ImportConfig::parse("[import]\nversion = \"2\"\n");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unsupported configuration version")
        );
    }

    #[test]
    fn test_missing_version() {
        assert!(ImportConfig::parse("[import]\nimport_mode = \"CREATE\"\n").is_err());
    }

    #[test]
    fn test_unknown_import_mode() {
        let invalid = "[import]\nversion = \"1\"\nimport_mode = \"UPSERT\"\n";
        assert!(matches!(
            ImportConfig::parse(invalid),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_rule_uid() {
        let invalid = r#"
[import]
version = "1"

[[rules]]
uid = "short"
name = "broken"
"#;
        let err = ImportConfig::parse(invalid).unwrap_err();
        assert!(err.to_string().contains("'short' is not a valid uid"));
    }

    #[test]
    fn test_duplicate_rule_uid() {
        let invalid = r#"
[import]
version = "1"

[[rules]]
uid = "NAgjOfWMXg6"
name = "one"

[[rules]]
uid = "NAgjOfWMXg6"
name = "two"
"#;
        let err = ImportConfig::parse(invalid).unwrap_err();
        assert!(err.to_string().contains("Duplicate rule uid"));
    }

    #[test]
    fn test_rule_action_outside_catalog_is_rejected() {
        let invalid = r#"
[import]
version = "1"

[[rules]]
uid = "NAgjOfWMXg6"
name = "First name is mandatory"

[[rules.actions]]
action_type = "SETMANDATORYFIELD"
attribute = "w75KJ2mc4zz"
"#;
        let err = ImportConfig::parse(invalid).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("SETMANDATORYFIELD"));
    }
}
