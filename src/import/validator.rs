//! Structural and semantic validators run over each submitted object
//!
//! Validators only report: they never touch the store and never fail. The
//! pipeline decides from the reported severities which objects are invalid.

use crate::import::bundle::BundleObject;
use crate::import::params::{IdScheme, ImportMode, ImportParams, Operation};
use crate::import::persistence::Persister;
use crate::report::{ErrorCode, ErrorReport};
use crate::rules::{BundleContext, ExecutorRegistry, RuleEngineEffects, TrackedRecord};
use crate::types::{ObjectType, Uid};
use std::collections::HashMap;

/// Uid of the stored object the submitted one matches, honouring the id scheme
///
/// With the CODE scheme, metadata objects that carry a code are matched by
/// code; everything else is matched by uid.
pub fn stored_uid(store: &dyn Persister, id_scheme: IdScheme, object: &BundleObject) -> Option<Uid> {
    match (id_scheme, object.code()) {
        (IdScheme::Code, Some(code)) => store.find_by_code(&object.object_type(), code),
        _ => store
            .exists(&object.object_type(), object.uid())
            .then(|| object.uid().clone()),
    }
}

/// Whether the object already exists, honouring the id scheme
pub fn object_exists(store: &dyn Persister, id_scheme: IdScheme, object: &BundleObject) -> bool {
    stored_uid(store, id_scheme, object).is_some()
}

/// Identifier of the object under the id scheme, for report arguments
pub fn object_identifier(id_scheme: IdScheme, object: &BundleObject) -> String {
    match (id_scheme, object.code()) {
        (IdScheme::Code, Some(code)) => code.to_string(),
        _ => object.uid().to_string(),
    }
}

/// Everything validators may consult while checking one bundle
pub struct ValidationContext<'a> {
    pub params: &'a ImportParams,
    pub store: &'a dyn Persister,
    pub bundle: &'a BundleContext<'a>,
    pub effects: &'a RuleEngineEffects,
    pub executors: &'a ExecutorRegistry,
    first_seen: HashMap<(ObjectType, &'a Uid), usize>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        params: &'a ImportParams,
        store: &'a dyn Persister,
        bundle: &'a BundleContext<'a>,
        effects: &'a RuleEngineEffects,
        executors: &'a ExecutorRegistry,
    ) -> Self {
        let mut first_seen = HashMap::new();
        for (index, object) in bundle.bundle().objects().into_iter().enumerate() {
            first_seen
                .entry((object.object_type(), object.uid()))
                .or_insert(index);
        }
        ValidationContext {
            params,
            store,
            bundle,
            effects,
            executors,
            first_seen,
        }
    }

    pub fn exists(&self, object: &BundleObject) -> bool {
        object_exists(self.store, self.params.id_scheme, object)
    }

    pub fn operation(&self, object: &BundleObject) -> Operation {
        self.params.import_mode.operation(self.exists(object))
    }

    /// Batch index of the first object with this type and uid
    pub fn first_index(&self, object_type: &ObjectType, uid: &Uid) -> Option<usize> {
        self.first_seen.get(&(object_type.clone(), uid)).copied()
    }

    /// Whether the object is in the bundle or already stored
    pub fn is_known(&self, object_type: &ObjectType, uid: &Uid) -> bool {
        self.first_index(object_type, uid).is_some() || self.store.exists(object_type, uid)
    }
}

/// A check applied to every submitted object
pub trait ObjectValidator {
    fn name(&self) -> &'static str;

    /// Whether the validator still runs when structural validation is skipped
    fn always_run(&self) -> bool {
        false
    }

    fn validate(
        &self,
        ctx: &ValidationContext,
        index: usize,
        object: &BundleObject,
    ) -> Vec<ErrorReport>;
}

/// Properties holding a uid, as (property name, value) pairs
fn uid_properties<'o>(object: &BundleObject<'o>) -> Vec<(&'static str, &'o Uid)> {
    let mut properties = Vec::new();
    let mut push = |name: &'static str, uid: Option<&'o Uid>| {
        if let Some(uid) = uid {
            properties.push((name, uid));
        }
    };
    match *object {
        BundleObject::TrackedEntity(te) => {
            push("trackedEntity", Some(&te.tracked_entity));
            push("trackedEntityType", te.tracked_entity_type.as_ref());
            push("orgUnit", te.org_unit.as_ref());
        }
        BundleObject::Enrollment(enrollment) => {
            push("enrollment", Some(&enrollment.enrollment));
            push("trackedEntity", enrollment.tracked_entity.as_ref());
            push("program", enrollment.program.as_ref());
            push("orgUnit", enrollment.org_unit.as_ref());
        }
        BundleObject::Event(event) => {
            push("event", Some(&event.event));
            push("enrollment", event.enrollment.as_ref());
            push("programStage", event.program_stage.as_ref());
            push("orgUnit", event.org_unit.as_ref());
        }
        BundleObject::Metadata(metadata) => {
            push("id", Some(&metadata.id));
            for reference in &metadata.references {
                push("references", Some(&reference.id));
            }
        }
    }
    properties
}

/// Missing required properties (E4000)
///
/// Deletions only need the identifier.
pub struct RequiredPropertiesValidator;

impl ObjectValidator for RequiredPropertiesValidator {
    fn name(&self) -> &'static str {
        "required-properties"
    }

    fn validate(&self, ctx: &ValidationContext, _: usize, object: &BundleObject) -> Vec<ErrorReport> {
        let mut missing: Vec<&str> = Vec::new();
        let (id_property, required): (&str, Vec<(&str, bool)>) = match *object {
            BundleObject::TrackedEntity(te) => (
                "trackedEntity",
                vec![
                    ("trackedEntityType", te.tracked_entity_type.is_some()),
                    ("orgUnit", te.org_unit.is_some()),
                ],
            ),
            BundleObject::Enrollment(enrollment) => (
                "enrollment",
                vec![
                    ("trackedEntity", enrollment.tracked_entity.is_some()),
                    ("program", enrollment.program.is_some()),
                    ("orgUnit", enrollment.org_unit.is_some()),
                ],
            ),
            BundleObject::Event(event) => (
                "event",
                vec![
                    ("programStage", event.program_stage.is_some()),
                    ("orgUnit", event.org_unit.is_some()),
                ],
            ),
            BundleObject::Metadata(metadata) => (
                "id",
                vec![
                    ("name", metadata.name.as_deref().is_some_and(|n| !n.trim().is_empty())),
                    (
                        "code",
                        ctx.params.id_scheme != IdScheme::Code || metadata.code.is_some(),
                    ),
                ],
            ),
        };

        if object.uid().as_str().is_empty() {
            missing.push(id_property);
        }
        if ctx.params.import_mode != ImportMode::Delete {
            missing.extend(
                required
                    .into_iter()
                    .filter(|(_, present)| !present)
                    .map(|(property, _)| property),
            );
        }

        missing
            .into_iter()
            .map(|property| ErrorReport::new(ErrorCode::E4000, object.object_type(), [property]))
            .collect()
    }
}

/// Malformed uids (E4014)
pub struct UidFormatValidator;

impl ObjectValidator for UidFormatValidator {
    fn name(&self) -> &'static str {
        "uid-format"
    }

    fn validate(&self, _: &ValidationContext, _: usize, object: &BundleObject) -> Vec<ErrorReport> {
        uid_properties(object)
            .into_iter()
            .filter(|(_, uid)| !uid.as_str().is_empty() && !uid.is_valid())
            .map(|(property, uid)| {
                ErrorReport::new(ErrorCode::E4014, object.object_type(), [uid.as_str(), property])
            })
            .collect()
    }
}

/// Later occurrences of a uid already used in the bundle (E5003)
pub struct DuplicateUidValidator;

impl ObjectValidator for DuplicateUidValidator {
    fn name(&self) -> &'static str {
        "duplicate-uid"
    }

    fn validate(&self, ctx: &ValidationContext, index: usize, object: &BundleObject) -> Vec<ErrorReport> {
        let object_type = object.object_type();
        match ctx.first_index(&object_type, object.uid()) {
            Some(first) if first != index && !object.uid().as_str().is_empty() => {
                vec![ErrorReport::new(
                    ErrorCode::E5003,
                    object_type.clone(),
                    [
                        "uid".to_string(),
                        object.uid().to_string(),
                        format!("{}#{}", object_type, index),
                        format!("{}#{}", object_type, first),
                    ],
                )]
            }
            _ => Vec::new(),
        }
    }
}

/// Import-mode-aware existence checks (E5000, E5001)
pub struct ExistenceValidator;

impl ObjectValidator for ExistenceValidator {
    fn name(&self) -> &'static str {
        "existence"
    }

    fn validate(&self, ctx: &ValidationContext, _: usize, object: &BundleObject) -> Vec<ErrorReport> {
        let exists = ctx.exists(object);
        let code = match ctx.params.import_mode {
            ImportMode::Create if exists => ErrorCode::E5000,
            ImportMode::Update | ImportMode::Delete if !exists => ErrorCode::E5001,
            _ => return Vec::new(),
        };
        vec![ErrorReport::new(
            code,
            object.object_type(),
            [
                ctx.params.id_scheme.as_str().to_string(),
                object_identifier(ctx.params.id_scheme, object),
            ],
        )]
    }
}

/// References to objects neither in the bundle nor in the store
pub struct ReferenceValidator;

impl ObjectValidator for ReferenceValidator {
    fn name(&self) -> &'static str {
        "references"
    }

    fn validate(&self, ctx: &ValidationContext, _: usize, object: &BundleObject) -> Vec<ErrorReport> {
        if ctx.params.import_mode == ImportMode::Delete {
            return Vec::new();
        }

        object
            .references()
            .into_iter()
            .filter(|(reference_type, uid)| !ctx.is_known(reference_type, uid))
            .map(|(_, uid)| match object {
                BundleObject::Enrollment(_) => ErrorReport::new(
                    ErrorCode::E1063,
                    object.object_type(),
                    [object.uid().as_str(), uid.as_str()],
                ),
                BundleObject::Event(_) => ErrorReport::new(
                    ErrorCode::E1033,
                    object.object_type(),
                    [object.uid().as_str(), uid.as_str()],
                ),
                _ => ErrorReport::new(
                    ErrorCode::E5001,
                    object.object_type(),
                    [ctx.params.id_scheme.as_str(), uid.as_str()],
                ),
            })
            .collect()
    }
}

/// Writes to protected object types (E3000, E3001, E3002)
pub struct AccessValidator;

impl ObjectValidator for AccessValidator {
    fn name(&self) -> &'static str {
        "access"
    }

    fn validate(&self, ctx: &ValidationContext, _: usize, object: &BundleObject) -> Vec<ErrorReport> {
        let object_type = object.object_type();
        if !ctx.params.is_protected(&object_type) {
            return Vec::new();
        }

        let username = ctx.params.username.as_str();
        let report = match ctx.operation(object) {
            Operation::Create => {
                ErrorReport::new(ErrorCode::E3000, object_type.clone(), [username, object_type.as_str()])
            }
            Operation::Update => {
                ErrorReport::new(ErrorCode::E3001, object_type, [username, object.uid().as_str()])
            }
            Operation::Delete => {
                ErrorReport::new(ErrorCode::E3002, object_type, [username, object.uid().as_str()])
            }
        };
        vec![report]
    }
}

/// Issues raised by rule validation effects on enrollments and events
pub struct RuleEffectsValidator;

impl ObjectValidator for RuleEffectsValidator {
    fn name(&self) -> &'static str {
        "rule-effects"
    }

    fn always_run(&self) -> bool {
        true
    }

    fn validate(&self, ctx: &ValidationContext, _: usize, object: &BundleObject) -> Vec<ErrorReport> {
        if ctx.params.import_mode == ImportMode::Delete {
            return Vec::new();
        }

        let record = match *object {
            BundleObject::Enrollment(enrollment) => TrackedRecord::Enrollment(enrollment),
            BundleObject::Event(event) => TrackedRecord::Event(event),
            _ => return Vec::new(),
        };

        let effects = ctx.effects.validation_effects(record.kind(), record.uid());
        ctx.executors
            .execute_all(ctx.bundle, effects, &record)
            .iter()
            .map(|issue| issue.to_error_report(&record))
            .collect()
    }
}

/// The validator chain in the order it runs
pub fn default_validators() -> Vec<Box<dyn ObjectValidator>> {
    vec![
        Box::new(RequiredPropertiesValidator),
        Box::new(UidFormatValidator),
        Box::new(DuplicateUidValidator),
        Box::new(ExistenceValidator),
        Box::new(ReferenceValidator),
        Box::new(AccessValidator),
        Box::new(RuleEffectsValidator),
    ]
}
