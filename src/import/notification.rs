//! Notification collaborator
//!
//! Only the decision to notify is made here; delivery belongs to the
//! dispatcher implementation. Dispatching never fails the import.

use crate::rules::NotificationEffect;

pub trait NotificationDispatcher {
    fn dispatch(&mut self, effect: &NotificationEffect);
}

/// Logs each notification decision at info level
#[derive(Debug, Default)]
pub struct LoggingDispatcher;

impl NotificationDispatcher for LoggingDispatcher {
    fn dispatch(&mut self, effect: &NotificationEffect) {
        tracing::info!(
            rule = %effect.rule_uid,
            record = %effect.record_uid,
            template = effect.template.as_ref().map(|t| t.as_str()).unwrap_or("-"),
            action_type = %effect.action_type,
            "notification scheduled"
        );
    }
}

/// Keeps every dispatched notification in memory
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    dispatched: Vec<NotificationEffect>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> &[NotificationEffect] {
        &self.dispatched
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, effect: &NotificationEffect) {
        self.dispatched.push(effect.clone());
    }
}
