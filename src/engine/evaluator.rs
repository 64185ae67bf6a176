#![forbid(unsafe_code)]

//! Parallel rule evaluation across the tracked records of a bundle
//!
//! This module provides the RuleEngine, which evaluates every program rule
//! against every enrollment and event using rayon. Each record produces a
//! task-local [`RuleEngineEffects`]; the partial aggregates are reduced with
//! [`RuleEngineEffects::merge`], so completion order only affects list order
//! within a key.

use crate::rules::{
    BundleContext, ProgramRule, RecordKind, RuleEffect, RuleEffects, RuleEngineEffects,
    RuleScope, TrackedRecord,
};
use rayon::prelude::*;

/// Evaluates configured program rules against tracked records
pub struct RuleEngine {
    rules: Vec<ProgramRule>,
}

impl RuleEngine {
    /// Creates a RuleEngine over the given rules
    ///
    /// Rules are expected to have passed validation against the metadata
    /// catalog already.
    pub fn new(rules: Vec<ProgramRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ProgramRule] {
        &self.rules
    }

    /// Evaluates all rules against all tracked records of the bundle
    ///
    /// # Arguments
    ///
    /// * `ctx` - Bundle lookups shared by every evaluation task
    ///
    /// # Returns
    ///
    /// The classified effects of every record, merged
    pub fn evaluate(&self, ctx: &BundleContext) -> RuleEngineEffects {
        let records = ctx.tracked_records();
        if self.rules.is_empty() || records.is_empty() {
            return RuleEngineEffects::new();
        }

        let effects = records
            .par_iter()
            .map(|record| {
                RuleEngineEffects::from_rule_effects(vec![self.evaluate_record(ctx, record)])
            })
            .reduce(RuleEngineEffects::new, RuleEngineEffects::merge);

        tracing::debug!(
            records = records.len(),
            rules = self.rules.len(),
            effects = effects.len(),
            "evaluated program rules"
        );

        effects
    }

    /// Evaluates all rules against a single record
    ///
    /// Returns the raw output: every action of every matching rule.
    pub fn evaluate_record(&self, ctx: &BundleContext, record: &TrackedRecord) -> RuleEffects {
        let effects = self
            .rules
            .iter()
            .filter(|rule| applies_to(rule.scope, record.kind()))
            .filter(|rule| rule.condition.matches(ctx, record))
            .flat_map(|rule| {
                rule.actions.iter().map(move |action| RuleEffect {
                    rule_uid: rule.uid.clone(),
                    action_type: action.action_type,
                    data: action.data.clone(),
                    field: action.field().cloned(),
                    content: action.content.clone(),
                    template: action.template.clone(),
                })
            })
            .collect();

        RuleEffects::new(record.uid().clone(), record.kind(), effects)
    }
}

fn applies_to(scope: RuleScope, kind: RecordKind) -> bool {
    match scope {
        RuleScope::All => true,
        RuleScope::Enrollment => kind == RecordKind::Enrollment,
        RuleScope::Event => kind == RecordKind::Event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::bundle::{Enrollment, Event, ImportBundle};
    use crate::rules::{Condition, RuleAction, RuleActionType};
    use crate::types::Uid;

    fn rule(scope: RuleScope, action: RuleAction) -> ProgramRule {
        ProgramRule {
            uid: Uid::new("tO1D62oB0tq"),
            name: "rule".to_string(),
            scope,
            condition: Condition::Always,
            actions: vec![action],
        }
    }

    fn bundle(enrollments: usize, events: usize) -> ImportBundle {
        ImportBundle {
            enrollments: (0..enrollments)
                .map(|i| Enrollment {
                    enrollment: Uid::new(format!("enrollment{i:02}")),
                    ..Default::default()
                })
                .collect(),
            events: (0..events)
                .map(|i| Event {
                    event: Uid::new(format!("eventxxxx{i:02}")),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_record_gets_its_effects() {
        let bundle = bundle(20, 30);
        let ctx = BundleContext::new(&bundle, false);
        let engine = RuleEngine::new(vec![rule(
            RuleScope::All,
            RuleAction::new(RuleActionType::ShowWarning).with_content("look"),
        )]);

        let effects = engine.evaluate(&ctx);
        assert_eq!(effects.enrollment_validation_effects().len(), 20);
        assert_eq!(effects.event_validation_effects().len(), 30);
        assert_eq!(effects.len(), 50);
    }

    #[test]
    fn test_scope_limits_records() {
        let bundle = bundle(2, 3);
        let ctx = BundleContext::new(&bundle, false);
        let engine = RuleEngine::new(vec![rule(
            RuleScope::Event,
            RuleAction::new(RuleActionType::SendMessage).with_template("Zx3dTm2nKq1"),
        )]);

        let effects = engine.evaluate(&ctx);
        assert!(effects.enrollment_notification_effects().is_empty());
        assert_eq!(effects.event_notification_effects().len(), 3);
    }

    #[test]
    fn test_non_matching_condition_yields_nothing() {
        let bundle = bundle(1, 0);
        let ctx = BundleContext::new(&bundle, false);
        let mut never = rule(RuleScope::All, RuleAction::new(RuleActionType::ShowError));
        never.condition = Condition::Not {
            condition: Box::new(Condition::Always),
        };
        let engine = RuleEngine::new(vec![never]);

        let record = TrackedRecord::Enrollment(&bundle.enrollments[0]);
        assert!(engine.evaluate_record(&ctx, &record).effects.is_empty());
        assert!(engine.evaluate(&ctx).is_empty());
    }
}
