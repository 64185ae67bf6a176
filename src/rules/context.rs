//! Read-only views rule executors and conditions evaluate against

use crate::import::bundle::{
    Attribute, Enrollment, EnrollmentStatus, Event, EventStatus, ImportBundle, TrackedEntity,
};
use crate::rules::effects::RecordKind;
use crate::types::{ObjectType, Uid};
use std::collections::HashMap;

/// Bundle-wide lookups shared by every rule evaluation of one import
#[derive(Debug)]
pub struct BundleContext<'a> {
    bundle: &'a ImportBundle,
    tracked_entities: HashMap<&'a Uid, &'a TrackedEntity>,
    enrollments: HashMap<&'a Uid, &'a Enrollment>,
    assign_overwrite: bool,
}

impl<'a> BundleContext<'a> {
    pub fn new(bundle: &'a ImportBundle, assign_overwrite: bool) -> Self {
        BundleContext {
            bundle,
            tracked_entities: bundle
                .tracked_entities
                .iter()
                .map(|te| (&te.tracked_entity, te))
                .collect(),
            enrollments: bundle
                .enrollments
                .iter()
                .map(|enrollment| (&enrollment.enrollment, enrollment))
                .collect(),
            assign_overwrite,
        }
    }

    pub fn bundle(&self) -> &'a ImportBundle {
        self.bundle
    }

    /// Whether ASSIGN may replace a value that differs from the calculated one
    pub fn assign_overwrite(&self) -> bool {
        self.assign_overwrite
    }

    pub fn tracked_entity(&self, uid: &Uid) -> Option<&'a TrackedEntity> {
        self.tracked_entities.get(uid).copied()
    }

    pub fn enrollment(&self, uid: &Uid) -> Option<&'a Enrollment> {
        self.enrollments.get(uid).copied()
    }

    /// Every enrollment and event of the bundle, enrollments first
    pub fn tracked_records(&self) -> Vec<TrackedRecord<'a>> {
        self.bundle
            .enrollments
            .iter()
            .map(TrackedRecord::Enrollment)
            .chain(self.bundle.events.iter().map(TrackedRecord::Event))
            .collect()
    }

    /// Attributes visible from an enrollment: its own, then its tracked entity's
    pub fn enrollment_attributes(&self, enrollment: &'a Enrollment) -> Vec<&'a Attribute> {
        let tracked_entity = enrollment
            .tracked_entity
            .as_ref()
            .and_then(|uid| self.tracked_entity(uid));
        enrollment
            .attributes
            .iter()
            .chain(tracked_entity.into_iter().flat_map(|te| te.attributes.iter()))
            .collect()
    }

    /// First attribute entry for `attribute` visible from the record
    ///
    /// Events see the attributes of their enrollment when it is in the bundle.
    pub fn attribute(&self, record: &TrackedRecord<'a>, attribute: &Uid) -> Option<&'a Attribute> {
        let enrollment = match record {
            TrackedRecord::Enrollment(enrollment) => Some(*enrollment),
            TrackedRecord::Event(event) => event
                .enrollment
                .as_ref()
                .and_then(|uid| self.enrollment(uid)),
        }?;
        self.enrollment_attributes(enrollment)
            .into_iter()
            .find(|candidate| &candidate.attribute == attribute)
    }
}

/// An enrollment or event the rule engine runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedRecord<'a> {
    Enrollment(&'a Enrollment),
    Event(&'a Event),
}

impl<'a> TrackedRecord<'a> {
    pub fn uid(&self) -> &'a Uid {
        match self {
            TrackedRecord::Enrollment(enrollment) => &enrollment.enrollment,
            TrackedRecord::Event(event) => &event.event,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            TrackedRecord::Enrollment(_) => RecordKind::Enrollment,
            TrackedRecord::Event(_) => RecordKind::Event,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            TrackedRecord::Enrollment(_) => ObjectType::enrollment(),
            TrackedRecord::Event(_) => ObjectType::event(),
        }
    }

    pub fn is_completed(&self) -> bool {
        match self {
            TrackedRecord::Enrollment(enrollment) => {
                enrollment.status == EnrollmentStatus::Completed
            }
            TrackedRecord::Event(event) => event.status == EventStatus::Completed,
        }
    }

    /// Status as it appears on the wire
    pub fn status(&self) -> &'static str {
        match self {
            TrackedRecord::Enrollment(enrollment) => match enrollment.status {
                EnrollmentStatus::Active => "ACTIVE",
                EnrollmentStatus::Completed => "COMPLETED",
                EnrollmentStatus::Cancelled => "CANCELLED",
            },
            TrackedRecord::Event(event) => match event.status {
                EventStatus::Active => "ACTIVE",
                EventStatus::Completed => "COMPLETED",
                EventStatus::Schedule => "SCHEDULE",
                EventStatus::Skipped => "SKIPPED",
            },
        }
    }

    /// Data value for a data element; enrollments carry none
    pub fn data_value(&self, data_element: &Uid) -> Option<&'a str> {
        match self {
            TrackedRecord::Enrollment(_) => None,
            TrackedRecord::Event(event) => event
                .data_values
                .iter()
                .find(|dv| &dv.data_element == data_element)
                .and_then(|dv| dv.value.as_deref()),
        }
    }
}
