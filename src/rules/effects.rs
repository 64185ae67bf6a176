//! Rule engine output, classified and grouped by owning record
//!
//! Raw per-record output is split into validation and notification effects,
//! keyed by record uid, separately for enrollments and events. Aggregates
//! built by independent evaluation tasks are combined with
//! [`RuleEngineEffects::merge`], which concatenates per-key lists and so is
//! associative and commutative up to list order within a key.

use crate::rules::action::RuleActionType;
use crate::types::Uid;
use serde::Serialize;
use std::collections::HashMap;

/// Kind of tracked record a rule output belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Enrollment,
    Event,
}

/// One fired rule action, before classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEffect {
    pub rule_uid: Uid,
    pub action_type: RuleActionType,
    pub data: Option<String>,
    /// Target data element or attribute
    pub field: Option<Uid>,
    pub content: Option<String>,
    pub template: Option<Uid>,
}

/// All rule effects produced for a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEffects {
    pub record_uid: Uid,
    pub kind: RecordKind,
    pub effects: Vec<RuleEffect>,
}

impl RuleEffects {
    pub fn new(record_uid: Uid, kind: RecordKind, effects: Vec<RuleEffect>) -> Self {
        RuleEffects {
            record_uid,
            kind,
            effects,
        }
    }
}

/// A rule effect that may block or warn on its record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationEffect {
    pub rule_uid: Uid,
    pub action_type: RuleActionType,
    pub field: Option<Uid>,
    pub data: Option<String>,
    pub content: Option<String>,
}

impl ValidationEffect {
    /// Returns the validation view of an effect, or None for other action types
    pub fn from_effect(effect: &RuleEffect) -> Option<Self> {
        effect.action_type.is_validation().then(|| ValidationEffect {
            rule_uid: effect.rule_uid.clone(),
            action_type: effect.action_type,
            field: effect.field.clone(),
            data: effect.data.clone(),
            content: effect.content.clone(),
        })
    }

    /// Content and data joined for display
    pub fn message(&self) -> String {
        [self.content.as_deref(), self.data.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A rule effect that triggers an outbound message for its record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEffect {
    pub rule_uid: Uid,
    pub action_type: RuleActionType,
    pub template: Option<Uid>,
    pub record_uid: Uid,
    pub data: Option<String>,
}

impl NotificationEffect {
    pub fn from_effect(effect: &RuleEffect, record_uid: &Uid) -> Option<Self> {
        effect.action_type.is_notification().then(|| NotificationEffect {
            rule_uid: effect.rule_uid.clone(),
            action_type: effect.action_type,
            template: effect.template.clone(),
            record_uid: record_uid.clone(),
            data: effect.data.clone(),
        })
    }
}

/// Bundle-wide rule effects, keyed by record uid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleEngineEffects {
    enrollment_validation: HashMap<Uid, Vec<ValidationEffect>>,
    event_validation: HashMap<Uid, Vec<ValidationEffect>>,
    enrollment_notification: HashMap<Uid, Vec<NotificationEffect>>,
    event_notification: HashMap<Uid, Vec<NotificationEffect>>,
}

fn append<V>(target: &mut HashMap<Uid, Vec<V>>, uid: &Uid, values: Vec<V>) {
    if values.is_empty() {
        return;
    }
    target.entry(uid.clone()).or_default().extend(values);
}

/// Folds `source` into `target`, concatenating lists under shared keys
fn concat_into<V>(target: &mut HashMap<Uid, Vec<V>>, source: HashMap<Uid, Vec<V>>) {
    for (uid, values) in source {
        target.entry(uid).or_default().extend(values);
    }
}

impl RuleEngineEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies raw per-record output
    ///
    /// Actions that are neither validation nor notification actions are
    /// dropped. Several outputs for the same record are concatenated.
    pub fn from_rule_effects(raw: Vec<RuleEffects>) -> Self {
        let mut effects = Self::new();
        for output in raw {
            let validation: Vec<ValidationEffect> = output
                .effects
                .iter()
                .filter_map(ValidationEffect::from_effect)
                .collect();
            let notification: Vec<NotificationEffect> = output
                .effects
                .iter()
                .filter_map(|effect| NotificationEffect::from_effect(effect, &output.record_uid))
                .collect();

            match output.kind {
                RecordKind::Enrollment => {
                    append(&mut effects.enrollment_validation, &output.record_uid, validation);
                    append(&mut effects.enrollment_notification, &output.record_uid, notification);
                }
                RecordKind::Event => {
                    append(&mut effects.event_validation, &output.record_uid, validation);
                    append(&mut effects.event_notification, &output.record_uid, notification);
                }
            }
        }
        effects
    }

    /// Combines two aggregates without losing any effect
    pub fn merge(a: Self, b: Self) -> Self {
        let mut merged = a;
        merged.merge_from(b);
        merged
    }

    /// In-place form of [`merge`](Self::merge)
    pub fn merge_from(&mut self, other: Self) {
        concat_into(&mut self.enrollment_validation, other.enrollment_validation);
        concat_into(&mut self.event_validation, other.event_validation);
        concat_into(&mut self.enrollment_notification, other.enrollment_notification);
        concat_into(&mut self.event_notification, other.event_notification);
    }

    /// Validation effects for a record of the given kind
    pub fn validation_effects(&self, kind: RecordKind, uid: &Uid) -> &[ValidationEffect] {
        let map = match kind {
            RecordKind::Enrollment => &self.enrollment_validation,
            RecordKind::Event => &self.event_validation,
        };
        map.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Notification effects for a record of the given kind
    pub fn notification_effects(&self, kind: RecordKind, uid: &Uid) -> &[NotificationEffect] {
        let map = match kind {
            RecordKind::Enrollment => &self.enrollment_notification,
            RecordKind::Event => &self.event_notification,
        };
        map.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn enrollment_validation_effects(&self) -> &HashMap<Uid, Vec<ValidationEffect>> {
        &self.enrollment_validation
    }

    pub fn event_validation_effects(&self) -> &HashMap<Uid, Vec<ValidationEffect>> {
        &self.event_validation
    }

    pub fn enrollment_notification_effects(&self) -> &HashMap<Uid, Vec<NotificationEffect>> {
        &self.enrollment_notification
    }

    pub fn event_notification_effects(&self) -> &HashMap<Uid, Vec<NotificationEffect>> {
        &self.event_notification
    }

    /// Total number of classified effects across all four maps
    pub fn len(&self) -> usize {
        let validation: usize = self
            .enrollment_validation
            .values()
            .chain(self.event_validation.values())
            .map(Vec::len)
            .sum();
        let notification: usize = self
            .enrollment_notification
            .values()
            .chain(self.event_notification.values())
            .map(Vec::len)
            .sum();
        validation + notification
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(action_type: RuleActionType) -> RuleEffect {
        RuleEffect {
            rule_uid: Uid::new("tO1D62oB0tq"),
            action_type,
            data: None,
            field: None,
            content: Some("text".to_string()),
            template: None,
        }
    }

    #[test]
    fn test_unclassified_actions_are_dropped() {
        let raw = vec![RuleEffects::new(
            Uid::new("MNWZ6hnuhSw"),
            RecordKind::Enrollment,
            vec![effect(RuleActionType::HideField), effect(RuleActionType::DisplayText)],
        )];
        assert!(RuleEngineEffects::from_rule_effects(raw).is_empty());
    }

    #[test]
    fn test_repeated_record_outputs_concatenate() {
        let uid = Uid::new("ZwwuwNp6gVd");
        let raw = vec![
            RuleEffects::new(uid.clone(), RecordKind::Event, vec![effect(RuleActionType::ShowError)]),
            RuleEffects::new(uid.clone(), RecordKind::Event, vec![effect(RuleActionType::ShowWarning)]),
        ];
        let effects = RuleEngineEffects::from_rule_effects(raw);
        assert_eq!(effects.validation_effects(RecordKind::Event, &uid).len(), 2);
        assert!(effects.validation_effects(RecordKind::Enrollment, &uid).is_empty());
    }

    #[test]
    fn test_validation_message() {
        let mut validation = ValidationEffect::from_effect(&effect(RuleActionType::ShowError)).unwrap();
        assert_eq!(validation.message(), "text");
        validation.data = Some("42".to_string());
        assert_eq!(validation.message(), "text 42");
        assert!(ValidationEffect::from_effect(&effect(RuleActionType::SendMessage)).is_none());
    }
}
