#![forbid(unsafe_code)]

//! Formatters for the `tracker-import actions` listing
//!
//! Each rule action type is shown with the validator capability that checks
//! it and the effect class its output is routed to.

use crate::rules::{EffectClass, RuleActionType, ValidatorRegistry};
use serde::Serialize;

/// One row of the action listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInfo {
    pub action_type: RuleActionType,
    pub capability: String,
    pub effect_class: EffectClass,
    pub executable: bool,
}

impl ActionInfo {
    /// Rows for every registered action type, in registry order
    pub fn collect(registry: &ValidatorRegistry, executable: impl Fn(RuleActionType) -> bool) -> Vec<Self> {
        registry
            .iter()
            .map(|(action_type, kind)| ActionInfo {
                action_type,
                capability: kind.to_string(),
                effect_class: action_type.effect_class(),
                executable: executable(action_type),
            })
            .collect()
    }
}

/// Human-readable formatter for the action listing
pub struct ActionListHumanFormatter;

impl ActionListHumanFormatter {
    pub fn new() -> Self {
        ActionListHumanFormatter
    }

    pub fn format(&self, actions: &[ActionInfo]) -> String {
        let mut output = String::new();

        output.push_str(&format!("Rule actions ({} registered):\n", actions.len()));
        output.push('\n');

        for action in actions {
            output.push_str(&format!(
                "{:<22} {:<13} {:<13}{}\n",
                action.action_type.as_str(),
                action.capability,
                action.effect_class.as_str(),
                if action.executable { " executor" } else { "" }
            ));
        }

        output
    }

    pub fn write_to_stdout(&self, actions: &[ActionInfo]) {
        print!("{}", self.format(actions));
    }
}

impl Default for ActionListHumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct JsonlAction<'a> {
    action_type: &'static str,
    capability: &'a str,
    effect_class: &'static str,
    executable: bool,
}

/// JSONL formatter for the action listing
pub struct ActionListJsonlFormatter;

impl ActionListJsonlFormatter {
    pub fn new() -> Self {
        ActionListJsonlFormatter
    }

    /// One JSON object per line for each action type
    pub fn format(&self, actions: &[ActionInfo]) -> String {
        let mut output = String::new();

        for action in actions {
            let record = JsonlAction {
                action_type: action.action_type.as_str(),
                capability: &action.capability,
                effect_class: action.effect_class.as_str(),
                executable: action.executable,
            };

            if let Ok(json) = serde_json::to_string(&record) {
                output.push_str(&json);
                output.push('\n');
            }
        }

        output
    }

    pub fn write_to_stdout(&self, actions: &[ActionInfo]) {
        print!("{}", self.format(actions));
    }
}

impl Default for ActionListJsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions() -> Vec<ActionInfo> {
        let registry = ValidatorRegistry::with_defaults().unwrap();
        ActionInfo::collect(&registry, |action_type| action_type.is_validation())
    }

    #[test]
    fn test_collect_covers_every_action_type() {
        let actions = actions();
        assert_eq!(actions.len(), RuleActionType::ALL.len());

        let mandatory = actions
            .iter()
            .find(|a| a.action_type == RuleActionType::SetMandatoryField)
            .unwrap();
        assert_eq!(mandatory.capability, "FieldTarget");
        assert_eq!(mandatory.effect_class, EffectClass::Validation);
        assert!(mandatory.executable);
    }

    #[test]
    fn test_human_format() {
        let output = ActionListHumanFormatter::new().format(&actions());
        assert!(output.starts_with("Rule actions (18 registered):\n\n"));
        assert!(output.contains("SENDMESSAGE"));
        assert!(output.contains("notification"));
    }

    #[test]
    fn test_jsonl_format() {
        let output = ActionListJsonlFormatter::new().format(&actions());
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 18);

        let message = lines
            .iter()
            .find(|line| line["action_type"] == "SCHEDULEMESSAGE")
            .unwrap();
        assert_eq!(message["capability"], "Notification");
        assert_eq!(message["effect_class"], "notification");
        assert_eq!(message["executable"], false);
    }
}
