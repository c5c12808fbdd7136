//! Multipart upload state management.
//!
//! Tracks in-progress multipart uploads and their parts. Each
//! [`MultipartUpload`] captures the metadata given at initiation and
//! accumulates [`UploadPart`] entries as they arrive. Completed and aborted
//! uploads are removed from the bucket's table, so later requests for them
//! find nothing.

use std::collections::BTreeMap;

use bcestack_bos_model::types::{Owner, UploadSummary};
use bcestack_bos_model::{ObjectMetadata, PartInfo};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};

/// Storage class reported for every upload.
pub const STORAGE_CLASS: &str = "STANDARD";

/// An in-progress multipart upload.
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    /// Unique identifier for this upload.
    pub upload_id: String,
    /// The object key that this upload will create.
    pub key: String,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    /// The owner who initiated the upload.
    pub owner: Owner,
    /// Object metadata captured at initiation.
    pub metadata: ObjectMetadata,
    /// Parts uploaded so far, keyed by part number.
    pub parts: BTreeMap<u32, UploadPart>,
}

/// One uploaded part.
#[derive(Debug, Clone)]
pub struct UploadPart {
    /// Number, ETag, size and upload time.
    pub info: PartInfo,
    /// The part bytes.
    pub data: Bytes,
}

impl MultipartUpload {
    /// Create a new multipart upload.
    #[must_use]
    pub fn new(upload_id: String, key: String, owner: Owner, metadata: ObjectMetadata) -> Self {
        Self {
            upload_id,
            key,
            initiated: Utc::now(),
            owner,
            metadata,
            parts: BTreeMap::new(),
        }
    }

    /// Insert or replace a part. A re-uploaded part number supersedes the
    /// earlier bytes.
    pub fn put_part(&mut self, part: UploadPart) {
        self.parts.insert(part.info.part_number, part);
    }

    /// The part records, without their bytes.
    #[must_use]
    pub fn part_infos(&self) -> BTreeMap<u32, PartInfo> {
        self.parts
            .iter()
            .map(|(n, part)| (*n, part.info.clone()))
            .collect()
    }

    /// Concatenate the bytes of `selected` parts, in the given order.
    #[must_use]
    pub fn assemble(&self, selected: &[PartInfo]) -> Bytes {
        let total: u64 = selected.iter().map(|p| p.size).sum();
        let mut buf = BytesMut::with_capacity(usize::try_from(total).unwrap_or_default());
        for info in selected {
            if let Some(part) = self.parts.get(&info.part_number) {
                buf.extend_from_slice(&part.data);
            }
        }
        buf.freeze()
    }

    /// The listing entry for this upload.
    #[must_use]
    pub fn summary(&self) -> UploadSummary {
        UploadSummary {
            key: self.key.clone(),
            upload_id: self.upload_id.clone(),
            owner: self.owner.clone(),
            initiated: self.initiated,
            storage_class: STORAGE_CLASS.to_owned(),
        }
    }
}

impl UploadPart {
    /// Record `data` as part `part_number` with the given ETag.
    #[must_use]
    pub fn new(part_number: u32, e_tag: String, data: Bytes) -> Self {
        Self {
            info: PartInfo {
                part_number,
                e_tag,
                size: data.len() as u64,
                last_modified: Utc::now(),
            },
            data,
        }
    }
}
