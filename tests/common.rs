//! Test utilities for tracker-import integration tests

#![allow(dead_code)]

use tracker_import::import::bundle::{
    Attribute, DataValue, Enrollment, EnrollmentStatus, Event, ImportBundle, TrackedEntity,
};
use tracker_import::rules::{Condition, ProgramRule, RuleAction, RuleScope};
use tracker_import::types::Uid;

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const ORG_UNIT: &str = "DiszpKrYNg8";
pub const TE_TYPE: &str = "nEenWmSyUEp";
pub const PROGRAM: &str = "IpHINAT79UW";
pub const PROGRAM_STAGE: &str = "A03MvHHogjR";
pub const FIRST_NAME: &str = "w75KJ2mc4zz";
pub const WEIGHT: &str = "qrur9Dvnyt5";
pub const TEMPLATE: &str = "Zp268JB6Ne5";

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Extract Some value or panic with context
#[macro_export]
macro_rules! assert_some {
    ($expr:expr) => {
        match $expr {
            Some(v) => v,
            None => panic!("assertion failed: expected Some, got None"),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Some(v) => v,
            None => panic!("{}: got None", $msg),
        }
    };
}

pub fn tracked_entity(uid: &str) -> TrackedEntity {
    TrackedEntity {
        tracked_entity: Uid::new(uid),
        tracked_entity_type: Some(Uid::new(TE_TYPE)),
        org_unit: Some(Uid::new(ORG_UNIT)),
        attributes: Vec::new(),
    }
}

pub fn enrollment(uid: &str, tracked_entity: &str) -> Enrollment {
    Enrollment {
        enrollment: Uid::new(uid),
        tracked_entity: Some(Uid::new(tracked_entity)),
        program: Some(Uid::new(PROGRAM)),
        org_unit: Some(Uid::new(ORG_UNIT)),
        status: EnrollmentStatus::Active,
        attributes: Vec::new(),
    }
}

pub fn enrollment_with_name(uid: &str, tracked_entity: &str, first_name: &str) -> Enrollment {
    Enrollment {
        attributes: vec![Attribute::new(FIRST_NAME, first_name)],
        ..enrollment(uid, tracked_entity)
    }
}

pub fn event(uid: &str, enrollment: &str) -> Event {
    Event {
        event: Uid::new(uid),
        enrollment: Some(Uid::new(enrollment)),
        program_stage: Some(Uid::new(PROGRAM_STAGE)),
        org_unit: Some(Uid::new(ORG_UNIT)),
        ..Default::default()
    }
}

pub fn event_with_weight(uid: &str, enrollment: &str, weight: &str) -> Event {
    Event {
        data_values: vec![DataValue::new(WEIGHT, weight)],
        ..event(uid, enrollment)
    }
}

/// One tracked entity with one enrollment and one event, all valid
pub fn family_bundle() -> ImportBundle {
    ImportBundle {
        tracked_entities: vec![tracked_entity("PQfMcpmXeFE")],
        enrollments: vec![enrollment_with_name("MNWZ6hnuhSw", "PQfMcpmXeFE", "Jane")],
        events: vec![event_with_weight("ZwwuwNp6gVd", "MNWZ6hnuhSw", "12")],
        metadata: Vec::new(),
    }
}

pub fn rule(uid: &str, scope: RuleScope, condition: Condition, actions: Vec<RuleAction>) -> ProgramRule {
    ProgramRule {
        uid: Uid::new(uid),
        name: format!("rule {}", uid),
        scope,
        condition,
        actions,
    }
}
