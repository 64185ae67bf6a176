//! Persistence collaborator interface and an in-memory reference store

use crate::error::PersistenceError;
use crate::import::bundle::{BundleObject, ImportBundle};
use crate::import::params::IdScheme;
use crate::report::{ErrorCode, ErrorReport};
use crate::types::{ObjectType, Uid};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Stores domain objects on behalf of the pipeline
///
/// Writes between `begin` and `commit` form one unit; `rollback` discards
/// every write since `begin`.
pub trait Persister {
    fn exists(&self, object_type: &ObjectType, uid: &Uid) -> bool;

    /// Resolves a metadata code to the uid of the stored object
    fn find_by_code(&self, object_type: &ObjectType, code: &str) -> Option<Uid>;

    fn create(&mut self, object: &BundleObject) -> Result<(), PersistenceError>;

    /// Replaces the stored object `uid` with the submitted one
    ///
    /// `uid` is the stored identifier, which differs from the submitted uid
    /// when the object was matched by code.
    fn update(&mut self, uid: &Uid, object: &BundleObject) -> Result<(), PersistenceError>;

    fn delete(&mut self, object_type: &ObjectType, uid: &Uid) -> Result<(), PersistenceError>;

    fn begin(&mut self);

    fn commit(&mut self);

    fn rollback(&mut self);
}

impl PersistenceError {
    /// Stable error code reported for this failure
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PersistenceError::ReferencedBy { .. } => ErrorCode::E4030,
            PersistenceError::NotFound { .. } => ErrorCode::E5001,
            PersistenceError::AlreadyExists { .. } => ErrorCode::E5000,
            PersistenceError::Rejected { .. } => ErrorCode::E1130,
        }
    }

    /// Report entry for the object the failure was raised against
    ///
    /// `identifier` names the object under the id scheme in use.
    pub fn to_error_report(&self, id_scheme: IdScheme, identifier: &str) -> ErrorReport {
        match self {
            PersistenceError::ReferencedBy {
                object_type,
                referenced_by,
                ..
            } => ErrorReport::new(self.error_code(), object_type.clone(), [referenced_by.as_str()]),
            PersistenceError::NotFound { object_type, .. }
            | PersistenceError::AlreadyExists { object_type, .. } => ErrorReport::new(
                self.error_code(),
                object_type.clone(),
                [id_scheme.as_str(), identifier],
            ),
            PersistenceError::Rejected {
                object_type,
                uid,
                reason,
            } => ErrorReport::new(
                self.error_code(),
                object_type.clone(),
                [object_type.as_str(), uid.as_str(), reason.as_str()],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredObject {
    code: Option<String>,
    references: Vec<(ObjectType, Uid)>,
}

type Key = (ObjectType, Uid);

/// In-memory store keyed by object type and uid
///
/// Deleting an object that other stored objects reference fails with
/// `PersistenceError::ReferencedBy`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    objects: IndexMap<Key, StoredObject>,
    snapshot: Option<IndexMap<Key, StoredObject>>,
    rejections: HashMap<Uid, String>,
}

fn key_of(object: &BundleObject) -> Key {
    (object.object_type(), object.uid().clone())
}

fn stored(object: &BundleObject) -> StoredObject {
    StoredObject {
        code: object.code().map(str::to_string),
        references: object
            .references()
            .into_iter()
            .map(|(object_type, uid)| (object_type, uid.clone()))
            .collect(),
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with every object of the bundle
    pub fn from_bundle(bundle: &ImportBundle) -> Self {
        let mut store = Self::new();
        for object in bundle.objects() {
            store.insert(&object);
        }
        store
    }

    /// Inserts or replaces an object without any checks
    pub fn insert(&mut self, object: &BundleObject) {
        self.objects.insert(key_of(object), stored(object));
    }

    /// Makes every future create or update of `uid` fail with `reason`
    pub fn reject_writes(&mut self, uid: impl Into<Uid>, reason: impl Into<String>) {
        self.rejections.insert(uid.into(), reason.into());
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn check_rejection(&self, object: &BundleObject) -> Result<(), PersistenceError> {
        match self.rejections.get(object.uid()) {
            Some(reason) => Err(PersistenceError::Rejected {
                object_type: object.object_type(),
                uid: object.uid().clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Persister for InMemoryStore {
    fn exists(&self, object_type: &ObjectType, uid: &Uid) -> bool {
        self.objects.contains_key(&(object_type.clone(), uid.clone()))
    }

    fn find_by_code(&self, object_type: &ObjectType, code: &str) -> Option<Uid> {
        self.objects
            .iter()
            .find(|((stored_type, _), object)| {
                stored_type == object_type && object.code.as_deref() == Some(code)
            })
            .map(|((_, uid), _)| uid.clone())
    }

    fn create(&mut self, object: &BundleObject) -> Result<(), PersistenceError> {
        let key = key_of(object);
        if self.objects.contains_key(&key) {
            return Err(PersistenceError::AlreadyExists {
                object_type: key.0,
                uid: key.1,
            });
        }
        self.check_rejection(object)?;
        self.objects.insert(key, stored(object));
        Ok(())
    }

    fn update(&mut self, uid: &Uid, object: &BundleObject) -> Result<(), PersistenceError> {
        let key = (object.object_type(), uid.clone());
        if !self.objects.contains_key(&key) {
            return Err(PersistenceError::NotFound {
                object_type: key.0,
                uid: key.1,
            });
        }
        self.check_rejection(object)?;
        self.objects.insert(key, stored(object));
        Ok(())
    }

    fn delete(&mut self, object_type: &ObjectType, uid: &Uid) -> Result<(), PersistenceError> {
        let key = (object_type.clone(), uid.clone());
        if !self.objects.contains_key(&key) {
            return Err(PersistenceError::NotFound {
                object_type: key.0,
                uid: key.1,
            });
        }

        let referenced_by = self.objects.iter().find(|(other, object)| {
            **other != key && object.references.iter().any(|reference| *reference == key)
        });
        if let Some(((other_type, other_uid), _)) = referenced_by {
            return Err(PersistenceError::ReferencedBy {
                object_type: key.0,
                uid: key.1,
                referenced_by: format!("{} {}", other_type, other_uid),
            });
        }

        self.objects.shift_remove(&key);
        Ok(())
    }

    fn begin(&mut self) {
        self.snapshot = Some(self.objects.clone());
    }

    fn commit(&mut self) {
        self.snapshot = None;
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.objects = snapshot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::bundle::{Enrollment, MetadataObject, TrackedEntity};

    fn tracked_entity() -> TrackedEntity {
        TrackedEntity {
            tracked_entity: Uid::new("PQfMcpmXeFE"),
            ..Default::default()
        }
    }

    fn enrollment() -> Enrollment {
        Enrollment {
            enrollment: Uid::new("MNWZ6hnuhSw"),
            tracked_entity: Some(Uid::new("PQfMcpmXeFE")),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_update_delete() {
        let te = tracked_entity();
        let object = BundleObject::TrackedEntity(&te);
        let mut store = InMemoryStore::new();

        assert!(matches!(
            store.update(&te.tracked_entity, &object),
            Err(PersistenceError::NotFound { .. })
        ));
        store.create(&object).unwrap();
        assert!(store.exists(&ObjectType::tracked_entity(), &te.tracked_entity));
        assert!(matches!(store.create(&object), Err(PersistenceError::AlreadyExists { .. })));
        store.update(&te.tracked_entity, &object).unwrap();
        store
            .delete(&ObjectType::tracked_entity(), &te.tracked_entity)
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_referenced_object_fails() {
        let te = tracked_entity();
        let enrollment = enrollment();
        let mut store = InMemoryStore::new();
        store.insert(&BundleObject::TrackedEntity(&te));
        store.insert(&BundleObject::Enrollment(&enrollment));

        let err = store
            .delete(&ObjectType::tracked_entity(), &te.tracked_entity)
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::E4030);
        let report = err.to_error_report(IdScheme::Uid, "PQfMcpmXeFE");
        assert!(report.message.contains("ENROLLMENT MNWZ6hnuhSw"));
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let te = tracked_entity();
        let mut store = InMemoryStore::new();
        store.begin();
        store.create(&BundleObject::TrackedEntity(&te)).unwrap();
        assert_eq!(store.len(), 1);
        store.rollback();
        assert!(store.is_empty());

        store.begin();
        store.create(&BundleObject::TrackedEntity(&te)).unwrap();
        store.commit();
        store.rollback();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejected_write_maps_to_e1130() {
        let te = tracked_entity();
        let mut store = InMemoryStore::new();
        store.reject_writes("PQfMcpmXeFE", "constraint violation");

        let err = store.create(&BundleObject::TrackedEntity(&te)).unwrap_err();
        let report = err.to_error_report(IdScheme::Uid, "PQfMcpmXeFE");
        assert_eq!(report.error_code, ErrorCode::E1130);
        assert_eq!(
            report.message,
            "TRACKED_ENTITY `PQfMcpmXeFE` could not be persisted: constraint violation"
        );
    }

    #[test]
    fn test_update_keeps_stored_uid() {
        let stored = MetadataObject {
            object_type: ObjectType::new("OPTION_SET").unwrap(),
            id: Uid::new("fUS7fy4HFaI"),
            name: Some("Yes/No".to_string()),
            code: Some("YES_NO".to_string()),
            references: Vec::new(),
        };
        let resubmitted = MetadataObject {
            id: Uid::new("Xr0M5zkhZTd"),
            code: Some("YES_NO".to_string()),
            ..stored.clone()
        };
        let mut store = InMemoryStore::new();
        store.insert(&BundleObject::Metadata(&stored));

        store
            .update(&stored.id, &BundleObject::Metadata(&resubmitted))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.exists(&stored.object_type, &stored.id));
        assert!(!store.exists(&stored.object_type, &resubmitted.id));

        let err = store
            .delete(&stored.object_type, &resubmitted.id)
            .unwrap_err();
        let report = err.to_error_report(IdScheme::Code, "YES_NO");
        assert_eq!(report.error_code, ErrorCode::E5001);
        assert!(report.message.ends_with("Identifier was CODE, and object was YES_NO"));
    }

    #[test]
    fn test_find_by_code() {
        let object = MetadataObject {
            object_type: ObjectType::new("OPTION_SET").unwrap(),
            id: Uid::new("fUS7fy4HFaI"),
            name: Some("Yes/No".to_string()),
            code: Some("YES_NO".to_string()),
            references: Vec::new(),
        };
        let mut store = InMemoryStore::new();
        store.insert(&BundleObject::Metadata(&object));

        assert_eq!(
            store.find_by_code(&object.object_type, "YES_NO"),
            Some(Uid::new("fUS7fy4HFaI"))
        );
        assert!(store.find_by_code(&ObjectType::event(), "YES_NO").is_none());
    }
}
