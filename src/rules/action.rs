//! Program rule action types and rule definitions

use crate::rules::condition::Condition;
use crate::rules::validator::ValidatorKind;
use crate::types::Uid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of rule action types
///
/// Unknown action type names are rejected when rules are deserialized, so
/// dispatch tables never see a type they were not built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleActionType {
    DisplayText,
    DisplayKeyValuePair,
    HideField,
    HideSection,
    HideProgramStage,
    Assign,
    ShowWarning,
    WarningOnComplete,
    ShowError,
    ErrorOnComplete,
    CreateEvent,
    SetMandatoryField,
    SendMessage,
    ScheduleMessage,
    ScheduleEvent,
    HideOption,
    ShowOptionGroup,
    HideOptionGroup,
}

/// Which side-effect class a rule action produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectClass {
    Validation,
    Notification,
    None,
}

impl EffectClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectClass::Validation => "validation",
            EffectClass::Notification => "notification",
            EffectClass::None => "none",
        }
    }
}

impl RuleActionType {
    /// Every known action type, in declaration order
    pub const ALL: [RuleActionType; 18] = [
        RuleActionType::DisplayText,
        RuleActionType::DisplayKeyValuePair,
        RuleActionType::HideField,
        RuleActionType::HideSection,
        RuleActionType::HideProgramStage,
        RuleActionType::Assign,
        RuleActionType::ShowWarning,
        RuleActionType::WarningOnComplete,
        RuleActionType::ShowError,
        RuleActionType::ErrorOnComplete,
        RuleActionType::CreateEvent,
        RuleActionType::SetMandatoryField,
        RuleActionType::SendMessage,
        RuleActionType::ScheduleMessage,
        RuleActionType::ScheduleEvent,
        RuleActionType::HideOption,
        RuleActionType::ShowOptionGroup,
        RuleActionType::HideOptionGroup,
    ];

    /// Returns the wire name of the action type
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleActionType::DisplayText => "DISPLAYTEXT",
            RuleActionType::DisplayKeyValuePair => "DISPLAYKEYVALUEPAIR",
            RuleActionType::HideField => "HIDEFIELD",
            RuleActionType::HideSection => "HIDESECTION",
            RuleActionType::HideProgramStage => "HIDEPROGRAMSTAGE",
            RuleActionType::Assign => "ASSIGN",
            RuleActionType::ShowWarning => "SHOWWARNING",
            RuleActionType::WarningOnComplete => "WARNINGONCOMPLETE",
            RuleActionType::ShowError => "SHOWERROR",
            RuleActionType::ErrorOnComplete => "ERRORONCOMPLETE",
            RuleActionType::CreateEvent => "CREATEEVENT",
            RuleActionType::SetMandatoryField => "SETMANDATORYFIELD",
            RuleActionType::SendMessage => "SENDMESSAGE",
            RuleActionType::ScheduleMessage => "SCHEDULEMESSAGE",
            RuleActionType::ScheduleEvent => "SCHEDULEEVENT",
            RuleActionType::HideOption => "HIDEOPTION",
            RuleActionType::ShowOptionGroup => "SHOWOPTIONGROUP",
            RuleActionType::HideOptionGroup => "HIDEOPTIONGROUP",
        }
    }

    /// Actions that can block or warn on the owning record
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RuleActionType::ShowWarning
                | RuleActionType::ShowError
                | RuleActionType::WarningOnComplete
                | RuleActionType::ErrorOnComplete
                | RuleActionType::SetMandatoryField
                | RuleActionType::Assign
        )
    }

    /// Actions that trigger an outbound message
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            RuleActionType::SendMessage | RuleActionType::ScheduleMessage
        )
    }

    pub fn effect_class(&self) -> EffectClass {
        if self.is_validation() {
            EffectClass::Validation
        } else if self.is_notification() {
            EffectClass::Notification
        } else {
            EffectClass::None
        }
    }

    /// The validator capability responsible for checking this action type
    pub fn validator_kind(&self) -> ValidatorKind {
        match self {
            RuleActionType::DisplayText
            | RuleActionType::DisplayKeyValuePair
            | RuleActionType::ShowWarning
            | RuleActionType::ShowError
            | RuleActionType::WarningOnComplete
            | RuleActionType::ErrorOnComplete => ValidatorKind::AlwaysValid,
            RuleActionType::HideField | RuleActionType::SetMandatoryField => {
                ValidatorKind::FieldTarget
            }
            RuleActionType::Assign => ValidatorKind::AssignValue,
            RuleActionType::HideSection => ValidatorKind::Section,
            RuleActionType::HideProgramStage
            | RuleActionType::CreateEvent
            | RuleActionType::ScheduleEvent => ValidatorKind::ProgramStage,
            RuleActionType::HideOption => ValidatorKind::OptionTarget,
            RuleActionType::ShowOptionGroup | RuleActionType::HideOptionGroup => {
                ValidatorKind::OptionGroup
            }
            RuleActionType::SendMessage | RuleActionType::ScheduleMessage => {
                ValidatorKind::Notification
            }
        }
    }
}

impl fmt::Display for RuleActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured action of a program rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    pub action_type: RuleActionType,

    /// Target data element (event fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_element: Option<Uid>,

    /// Target tracked entity attribute (enrollment fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Uid>,

    /// Static text shown with the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Value or expression result carried by the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Notification template for message actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Uid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<Uid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_group: Option<Uid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_stage: Option<Uid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Uid>,
}

impl RuleAction {
    /// Creates an action of the given type with no targets
    pub fn new(action_type: RuleActionType) -> Self {
        RuleAction {
            action_type,
            data_element: None,
            attribute: None,
            content: None,
            data: None,
            template: None,
            option: None,
            option_group: None,
            program_stage: None,
            section: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<Uid>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_data_element(mut self, data_element: impl Into<Uid>) -> Self {
        self.data_element = Some(data_element.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<Uid>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// The field this action targets: data element first, then attribute
    pub fn field(&self) -> Option<&Uid> {
        self.data_element.as_ref().or(self.attribute.as_ref())
    }
}

/// Which tracked records a rule is evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    #[default]
    All,
    Enrollment,
    Event,
}

/// A program rule: a condition plus the actions it fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRule {
    pub uid: Uid,

    pub name: String,

    #[serde(default)]
    pub scope: RuleScope,

    #[serde(default)]
    pub condition: Condition,

    #[serde(default)]
    pub actions: Vec<RuleAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_types_are_distinct() {
        let unique: HashSet<_> = RuleActionType::ALL.iter().collect();
        assert_eq!(unique.len(), RuleActionType::ALL.len());
    }

    #[test]
    fn test_wire_names_round_trip() {
        for action_type in RuleActionType::ALL {
            let json = serde_json::to_string(&action_type).unwrap();
            assert_eq!(json, format!("\"{}\"", action_type.as_str()));
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<RuleActionType>("\"HIDEEVERYTHING\"").is_err());
    }

    #[test]
    fn test_validation_and_notification_sets_are_disjoint() {
        for action_type in RuleActionType::ALL {
            assert!(!(action_type.is_validation() && action_type.is_notification()));
        }
        assert_eq!(
            RuleActionType::ALL.iter().filter(|t| t.is_validation()).count(),
            6
        );
        assert_eq!(
            RuleActionType::ALL
                .iter()
                .filter(|t| t.is_notification())
                .count(),
            2
        );
        assert_eq!(RuleActionType::HideField.effect_class(), EffectClass::None);
        assert_eq!(RuleActionType::DisplayText.effect_class(), EffectClass::None);
    }

    #[test]
    fn test_shared_capabilities() {
        assert_eq!(
            RuleActionType::ShowOptionGroup.validator_kind(),
            RuleActionType::HideOptionGroup.validator_kind()
        );
        assert_eq!(
            RuleActionType::DisplayText.validator_kind(),
            ValidatorKind::AlwaysValid
        );
        assert_eq!(
            RuleActionType::CreateEvent.validator_kind(),
            ValidatorKind::ProgramStage
        );
    }

    #[test]
    fn test_field_prefers_data_element() {
        let action = RuleAction::new(RuleActionType::Assign)
            .with_attribute("w75KJ2mc4zz")
            .with_data_element("qrur9Dvnyt5");
        assert_eq!(action.field().map(Uid::as_str), Some("qrur9Dvnyt5"));
    }
}
