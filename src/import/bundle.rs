//! Objects submitted for import
//!
//! A bundle is deserialized from JSON with `camelCase` keys. The submitted
//! batch order is tracked entities, enrollments, events, then metadata
//! objects; positional indices in reports refer to that order.

use crate::error::ConfigError;
use crate::types::{ObjectType, Uid};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Attribute value on a tracked entity or enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub attribute: Uid,
    #[serde(default)]
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(attribute: impl Into<Uid>, value: impl Into<String>) -> Self {
        Attribute {
            attribute: attribute.into(),
            value: Some(value.into()),
        }
    }
}

/// Data value on an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub data_element: Uid,
    #[serde(default)]
    pub value: Option<String>,
}

impl DataValue {
    pub fn new(data_element: impl Into<Uid>, value: impl Into<String>) -> Self {
        DataValue {
            data_element: data_element.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub tracked_entity: Uid,
    #[serde(default)]
    pub tracked_entity_type: Option<Uid>,
    #[serde(default)]
    pub org_unit: Option<Uid>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub enrollment: Uid,
    #[serde(default)]
    pub tracked_entity: Option<Uid>,
    #[serde(default)]
    pub program: Option<Uid>,
    #[serde(default)]
    pub org_unit: Option<Uid>,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    #[default]
    Active,
    Completed,
    Schedule,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event: Uid,
    #[serde(default)]
    pub enrollment: Option<Uid>,
    #[serde(default)]
    pub program_stage: Option<Uid>,
    #[serde(default)]
    pub org_unit: Option<Uid>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub data_values: Vec<DataValue>,
}

/// A general metadata object, keyed by its schema type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataObject {
    pub object_type: ObjectType,
    pub id: Uid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    /// Other metadata objects this one points at
    #[serde(default)]
    pub references: Vec<MetadataReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataReference {
    pub object_type: ObjectType,
    pub id: Uid,
}

/// A batch of objects submitted in one import call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportBundle {
    pub tracked_entities: Vec<TrackedEntity>,
    pub enrollments: Vec<Enrollment>,
    pub events: Vec<Event>,
    pub metadata: Vec<MetadataObject>,
}

impl ImportBundle {
    /// Loads a bundle from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// All objects in batch order; an object's position is its report index
    pub fn objects(&self) -> Vec<BundleObject<'_>> {
        self.tracked_entities
            .iter()
            .map(BundleObject::TrackedEntity)
            .chain(self.enrollments.iter().map(BundleObject::Enrollment))
            .chain(self.events.iter().map(BundleObject::Event))
            .chain(self.metadata.iter().map(BundleObject::Metadata))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tracked_entities.len() + self.enrollments.len() + self.events.len() + self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tracked_entity(&self, uid: &Uid) -> Option<&TrackedEntity> {
        self.tracked_entities
            .iter()
            .find(|te| &te.tracked_entity == uid)
    }

    pub fn enrollment(&self, uid: &Uid) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| &e.enrollment == uid)
    }
}

/// Borrowed view of one submitted object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleObject<'a> {
    TrackedEntity(&'a TrackedEntity),
    Enrollment(&'a Enrollment),
    Event(&'a Event),
    Metadata(&'a MetadataObject),
}

impl<'a> BundleObject<'a> {
    pub fn uid(&self) -> &'a Uid {
        match self {
            BundleObject::TrackedEntity(te) => &te.tracked_entity,
            BundleObject::Enrollment(enrollment) => &enrollment.enrollment,
            BundleObject::Event(event) => &event.event,
            BundleObject::Metadata(object) => &object.id,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            BundleObject::TrackedEntity(_) => ObjectType::tracked_entity(),
            BundleObject::Enrollment(_) => ObjectType::enrollment(),
            BundleObject::Event(_) => ObjectType::event(),
            BundleObject::Metadata(object) => object.object_type.clone(),
        }
    }

    /// Code of a metadata object; tracker objects have none
    pub fn code(&self) -> Option<&'a str> {
        match self {
            BundleObject::Metadata(object) => object.code.as_deref(),
            _ => None,
        }
    }

    /// Objects this one points at, as (type, uid) pairs
    pub fn references(&self) -> Vec<(ObjectType, &'a Uid)> {
        match self {
            BundleObject::TrackedEntity(_) => Vec::new(),
            BundleObject::Enrollment(enrollment) => enrollment
                .tracked_entity
                .iter()
                .map(|uid| (ObjectType::tracked_entity(), uid))
                .collect(),
            BundleObject::Event(event) => event
                .enrollment
                .iter()
                .map(|uid| (ObjectType::enrollment(), uid))
                .collect(),
            BundleObject::Metadata(object) => object
                .references
                .iter()
                .map(|reference| (reference.object_type.clone(), &reference.id))
                .collect(),
        }
    }
}
