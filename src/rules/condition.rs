//! Declarative rule conditions evaluated against a tracked record

use crate::rules::context::{BundleContext, TrackedRecord};
use crate::types::Uid;
use serde::{Deserialize, Serialize};

/// Condition under which a program rule fires
///
/// Serialized as an internally tagged table, for example
/// `{ type = "attribute_equals", attribute = "w75KJ2mc4zz", value = "yes" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    AttributeMissing {
        attribute: Uid,
    },
    AttributeEquals {
        attribute: Uid,
        value: String,
    },
    DataValueMissing {
        data_element: Uid,
    },
    DataValueEquals {
        data_element: Uid,
        value: String,
    },
    StatusIs {
        status: String,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

impl Condition {
    /// Evaluates the condition; empty `all` is true and empty `any` is false
    pub fn matches(&self, ctx: &BundleContext, record: &TrackedRecord) -> bool {
        match self {
            Condition::Always => true,
            Condition::AttributeMissing { attribute } => is_blank(
                ctx.attribute(record, attribute)
                    .and_then(|attribute| attribute.value.as_deref()),
            ),
            Condition::AttributeEquals { attribute, value } => ctx
                .attribute(record, attribute)
                .and_then(|attribute| attribute.value.as_deref())
                .is_some_and(|current| current == value),
            Condition::DataValueMissing { data_element } => {
                is_blank(record.data_value(data_element))
            }
            Condition::DataValueEquals {
                data_element,
                value,
            } => record
                .data_value(data_element)
                .is_some_and(|current| current == value),
            Condition::StatusIs { status } => record.status().eq_ignore_ascii_case(status),
            Condition::All { conditions } => conditions.iter().all(|c| c.matches(ctx, record)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.matches(ctx, record)),
            Condition::Not { condition } => !condition.matches(ctx, record),
        }
    }

    /// Every uid the condition refers to, for identifier validation
    pub fn referenced_uids(&self) -> Vec<&Uid> {
        match self {
            Condition::Always | Condition::StatusIs { .. } => Vec::new(),
            Condition::AttributeMissing { attribute }
            | Condition::AttributeEquals { attribute, .. } => vec![attribute],
            Condition::DataValueMissing { data_element }
            | Condition::DataValueEquals { data_element, .. } => vec![data_element],
            Condition::All { conditions } | Condition::Any { conditions } => conditions
                .iter()
                .flat_map(Condition::referenced_uids)
                .collect(),
            Condition::Not { condition } => condition.referenced_uids(),
        }
    }
}
