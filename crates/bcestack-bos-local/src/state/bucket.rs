//! Bucket state.

use std::collections::BTreeMap;

use bcestack_bos_model::types::{BucketSummary, CannedAcl, Grant, Owner, Permission};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use super::multipart::MultipartUpload;
use super::object::StoredObject;

/// A BOS bucket with its objects, in-progress uploads and ACL.
///
/// Thread-safe: the object map and the ACL sit behind `parking_lot::RwLock`,
/// multipart uploads live in a `DashMap` keyed by upload id.
pub struct BosBucket {
    /// Bucket name.
    pub name: String,
    /// Region the bucket was created in.
    pub region: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
    /// The bucket owner.
    pub owner: Owner,
    /// Objects keyed by key, in key order.
    pub objects: RwLock<BTreeMap<String, StoredObject>>,
    /// In-progress multipart uploads, keyed by upload id.
    pub multipart_uploads: DashMap<String, MultipartUpload>,
    /// Access control list.
    pub acl: RwLock<Vec<Grant>>,
}

impl std::fmt::Debug for BosBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BosBucket")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("creation_date", &self.creation_date)
            .field("owner", &self.owner)
            .field("object_count", &self.objects.read().len())
            .field("multipart_upload_count", &self.multipart_uploads.len())
            .finish_non_exhaustive()
    }
}

impl BosBucket {
    /// Create a private bucket.
    #[must_use]
    pub fn new(name: String, region: String, owner: Owner) -> Self {
        let acl = CannedAcl::Private.to_grants(&owner.id);
        Self {
            name,
            region,
            creation_date: Utc::now(),
            owner,
            objects: RwLock::new(BTreeMap::new()),
            multipart_uploads: DashMap::new(),
            acl: RwLock::new(acl),
        }
    }

    /// Whether the bucket holds no objects and no in-progress uploads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty() && self.multipart_uploads.is_empty()
    }

    /// A copy of the object stored under `key`.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    /// Store an object, replacing any object under the same key.
    pub fn put_object(&self, object: StoredObject) {
        self.objects.write().insert(object.key.clone(), object);
    }

    /// Remove and return the object stored under `key`.
    pub fn delete_object(&self, key: &str) -> Option<StoredObject> {
        self.objects.write().remove(key)
    }

    /// The current grants.
    #[must_use]
    pub fn grants(&self) -> Vec<Grant> {
        self.acl.read().clone()
    }

    /// Replace the grants.
    pub fn set_grants(&self, grants: Vec<Grant>) {
        *self.acl.write() = grants;
    }

    /// Whether any grant gives `permission` to the requester `id` (`None`
    /// for anonymous requesters).
    #[must_use]
    pub fn allows(&self, id: Option<&str>, permission: Permission) -> bool {
        self.acl.read().iter().any(|g| g.allows(id, permission))
    }

    /// The listing entry for this bucket.
    #[must_use]
    pub fn summary(&self) -> BucketSummary {
        BucketSummary {
            name: self.name.clone(),
            location: self.region.clone(),
            creation_date: self.creation_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use bcestack_bos_model::ObjectMetadata;
    use bytes::Bytes;

    use super::*;

    fn bucket() -> BosBucket {
        BosBucket::new(
            "bucket".to_owned(),
            "bj".to_owned(),
            Owner {
                id: "owner".to_owned(),
                display_name: "owner".to_owned(),
            },
        )
    }

    #[test]
    fn test_should_start_private_and_empty() {
        let bucket = bucket();
        assert!(bucket.is_empty());
        assert!(bucket.allows(Some("owner"), Permission::Write));
        assert!(!bucket.allows(None, Permission::Read));
    }

    #[test]
    fn test_should_open_to_anonymous_with_public_grants() {
        let bucket = bucket();
        bucket.set_grants(CannedAcl::PublicRead.to_grants("owner"));
        assert!(bucket.allows(None, Permission::Read));
        assert!(!bucket.allows(None, Permission::Write));
    }

    #[test]
    fn test_should_store_and_delete_objects() {
        let bucket = bucket();
        bucket.put_object(StoredObject::new(
            "k",
            Bytes::from_static(b"v"),
            ObjectMetadata::default(),
        ));
        assert!(!bucket.is_empty());
        assert_eq!(bucket.get_object("k").unwrap().data, "v");
        assert!(bucket.delete_object("k").is_some());
        assert!(bucket.get_object("k").is_none());
    }
}
