//! Top-level service state.
//!
//! [`BosServiceState`] manages the collection of buckets and enforces
//! bucket-name uniqueness. All operations are thread-safe via `DashMap`.

use bcestack_bos_model::types::{BucketSummary, Owner};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::Ref;
use tracing::{debug, info};

use crate::error::LocalServiceError;

use super::bucket::BosBucket;

/// Top-level service state holding all buckets.
pub struct BosServiceState {
    /// Bucket name to `BosBucket` mapping.
    buckets: DashMap<String, BosBucket>,
}

impl std::fmt::Debug for BosServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BosServiceState")
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for BosServiceState {
    fn default() -> Self {
        Self::new()
    }
}

impl BosServiceState {
    /// Create a new, empty service state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Create a new bucket.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServiceError::BucketAlreadyExists`] if the name is
    /// taken.
    pub fn create_bucket(
        &self,
        name: String,
        region: String,
        owner: Owner,
    ) -> Result<(), LocalServiceError> {
        match self.buckets.entry(name.clone()) {
            Entry::Occupied(_) => Err(LocalServiceError::BucketAlreadyExists { bucket: name }),
            Entry::Vacant(slot) => {
                slot.insert(BosBucket::new(name.clone(), region, owner));
                info!(bucket = %name, "bucket created");
                Ok(())
            }
        }
    }

    /// Delete an empty bucket.
    ///
    /// # Errors
    ///
    /// - [`LocalServiceError::NoSuchBucket`] if the bucket does not exist.
    /// - [`LocalServiceError::BucketNotEmpty`] if it still holds objects or
    ///   in-progress uploads.
    pub fn delete_bucket(&self, name: &str) -> Result<(), LocalServiceError> {
        if self
            .buckets
            .remove_if(name, |_, bucket| bucket.is_empty())
            .is_some()
        {
            info!(bucket = %name, "bucket deleted");
            return Ok(());
        }
        if self.buckets.contains_key(name) {
            Err(LocalServiceError::BucketNotEmpty {
                bucket: name.to_owned(),
            })
        } else {
            Err(LocalServiceError::NoSuchBucket {
                bucket: name.to_owned(),
            })
        }
    }

    /// Get a reference to a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServiceError::NoSuchBucket`] if the bucket does not
    /// exist.
    pub fn get_bucket(&self, name: &str) -> Result<Ref<'_, String, BosBucket>, LocalServiceError> {
        self.buckets
            .get(name)
            .ok_or_else(|| LocalServiceError::NoSuchBucket {
                bucket: name.to_owned(),
            })
    }

    /// List all buckets sorted by name.
    #[must_use]
    pub fn list_buckets(&self) -> Vec<BucketSummary> {
        let mut buckets: Vec<BucketSummary> = self
            .buckets
            .iter()
            .map(|entry| entry.value().summary())
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
    }

    /// Check whether a bucket exists.
    #[must_use]
    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Reset all state, removing all buckets.
    pub fn reset(&self) {
        debug!("resetting all BOS service state");
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use bcestack_bos_model::ObjectMetadata;
    use bytes::Bytes;

    use crate::state::StoredObject;

    use super::*;

    fn create(state: &BosServiceState, name: &str) -> Result<(), LocalServiceError> {
        state.create_bucket(name.to_owned(), "bj".to_owned(), Owner::default())
    }

    #[test]
    fn test_should_create_empty_service_state() {
        let state = BosServiceState::new();
        assert!(!state.bucket_exists("anything"));
        assert!(state.list_buckets().is_empty());
    }

    #[test]
    fn test_should_reject_duplicate_bucket() {
        let state = BosServiceState::new();
        create(&state, "bucket").unwrap();
        assert!(matches!(
            create(&state, "bucket"),
            Err(LocalServiceError::BucketAlreadyExists { .. })
        ));
    }

    #[test]
    fn test_should_list_buckets_sorted_by_name() {
        let state = BosServiceState::new();
        create(&state, "zeta").unwrap();
        create(&state, "alpha").unwrap();
        let names: Vec<String> = state.list_buckets().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_should_refuse_to_delete_non_empty_bucket() {
        let state = BosServiceState::new();
        create(&state, "bucket").unwrap();
        state.get_bucket("bucket").unwrap().put_object(StoredObject::new(
            "k",
            Bytes::from_static(b"v"),
            ObjectMetadata::default(),
        ));
        assert!(matches!(
            state.delete_bucket("bucket"),
            Err(LocalServiceError::BucketNotEmpty { .. })
        ));

        state.get_bucket("bucket").unwrap().delete_object("k");
        state.delete_bucket("bucket").unwrap();
        assert!(matches!(
            state.delete_bucket("bucket"),
            Err(LocalServiceError::NoSuchBucket { .. })
        ));
    }

    #[test]
    fn test_should_reset_all_buckets() {
        let state = BosServiceState::new();
        create(&state, "bucket").unwrap();
        state.reset();
        assert!(!state.bucket_exists("bucket"));
    }
}
