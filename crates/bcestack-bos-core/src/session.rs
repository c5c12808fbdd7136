//! Client-side multipart upload sessions.
//!
//! An [`UploadSession`] coordinates one multipart upload: it records every
//! part the service acknowledged, projects them as a sorted listing, and
//! checks a completion request against its own inventory before the request
//! goes out.
//!
//! ```text
//! Initiated --upload_part--> PartsUploading --complete--> Completed
//!     |                            |
//!     +-----------abort------------+--------------------> Aborted
//! ```
//!
//! The part inventory is a `DashMap` keyed by part number, so uploads of
//! different parts never contend. Uploads of the same part number queue on a
//! per-part async lock held from send to record, so the recorded ETag is the
//! one of the last write the service applied. Part writes hold the status
//! lock in read mode while they record a part; terminal transitions take it
//! in write mode, so a part is never recorded into a finished session.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bcestack_bos_model::checksum::md5_hex;
use bcestack_bos_model::input::{
    AbortMultipartUploadRequest, CompleteMultipartUploadRequest, ListPartsRequest,
    UploadPartRequest,
};
use bcestack_bos_model::multipart::{
    MAX_PART_NUMBER, PartPage, effective_max_entries, paginate_parts, validate_completion,
    validate_part_number,
};
use bcestack_bos_model::output::CompleteMultipartUploadResponse;
use bcestack_bos_model::{BosError, BosResult, ObjectMetadata, PartETag, PartInfo};
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::client::BosClient;

/// Lifecycle state of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    /// Created; no part acknowledged yet.
    Initiated,
    /// At least one part acknowledged.
    PartsUploading,
    /// Assembled into an object.
    Completed,
    /// Abandoned; the upload id is dead.
    Aborted,
}

impl UploadStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Name of the state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "Initiated",
            Self::PartsUploading => "PartsUploading",
            Self::Completed => "Completed",
            Self::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a completed session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    /// ETag of the assembled object.
    pub e_tag: String,
    /// URL of the assembled object.
    pub location: String,
    /// Metadata of the assembled object: the initiation metadata, with
    /// unset fields filled from the completion metadata.
    pub metadata: ObjectMetadata,
}

/// One multipart upload, driven through a [`BosClient`].
pub struct UploadSession {
    bucket: String,
    key: String,
    upload_id: String,
    metadata: ObjectMetadata,
    min_part_size: u64,
    status: RwLock<UploadStatus>,
    parts: DashMap<u32, PartInfo>,
    /// One lock per part number, held across send and record.
    part_writes: DashMap<u32, Arc<tokio::sync::Mutex<()>>>,
    completed: RwLock<Option<CompletedUpload>>,
    /// Serializes `complete` and `abort` across their network calls.
    finishing: tokio::sync::Mutex<()>,
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("upload_id", &self.upload_id)
            .field("status", &*self.status.read())
            .field("part_count", &self.parts.len())
            .finish_non_exhaustive()
    }
}

impl UploadSession {
    /// A fresh session for an upload the service just initiated.
    #[must_use]
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        upload_id: impl Into<String>,
        metadata: ObjectMetadata,
        min_part_size: u64,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            upload_id: upload_id.into(),
            metadata,
            min_part_size,
            status: RwLock::new(UploadStatus::Initiated),
            parts: DashMap::new(),
            part_writes: DashMap::new(),
            completed: RwLock::new(None),
            finishing: tokio::sync::Mutex::new(()),
        }
    }

    /// Rebuild a session from parts the service already holds.
    #[must_use]
    pub fn from_parts(
        bucket: impl Into<String>,
        key: impl Into<String>,
        upload_id: impl Into<String>,
        min_part_size: u64,
        parts: impl IntoIterator<Item = PartInfo>,
    ) -> Self {
        let session = Self::new(bucket, key, upload_id, ObjectMetadata::default(), min_part_size);
        for part in parts {
            session.parts.insert(part.part_number, part);
        }
        if !session.parts.is_empty() {
            *session.status.write() = UploadStatus::PartsUploading;
        }
        session
    }

    /// Bucket of the upload.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key of the upload.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Opaque upload id assigned by the service.
    #[must_use]
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// Metadata captured at initiation.
    #[must_use]
    pub fn metadata(&self) -> &ObjectMetadata {
        &self.metadata
    }

    /// Current state.
    #[must_use]
    pub fn status(&self) -> UploadStatus {
        *self.status.read()
    }

    /// Number of recorded parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// The recorded entry for a part number.
    #[must_use]
    pub fn part(&self, part_number: u32) -> Option<PartInfo> {
        self.parts.get(&part_number).map(|entry| entry.value().clone())
    }

    /// The `{part_number, e_tag}` list of every recorded part, ascending.
    #[must_use]
    pub fn part_etags(&self) -> Vec<PartETag> {
        self.snapshot().values().map(PartInfo::to_part_etag).collect()
    }

    /// The result of a successful completion.
    #[must_use]
    pub fn completed(&self) -> Option<CompletedUpload> {
        self.completed.read().clone()
    }

    /// Page through the recorded parts in ascending order: parts numbered
    /// above `part_number_marker`, at most `max_parts` (capped at 1000).
    #[must_use]
    pub fn list_parts(&self, part_number_marker: Option<u32>, max_parts: Option<u32>) -> PartPage {
        paginate_parts(
            &self.snapshot(),
            part_number_marker.unwrap_or(0),
            effective_max_entries(max_parts),
        )
    }

    /// Upload one part.
    ///
    /// The part number is checked before any network call. The MD5 of `data`
    /// travels as `Content-MD5`; the recorded ETag is the one the service
    /// reports, or the local MD5 when it reports none. Re-uploading a part
    /// number replaces its entry; concurrent uploads of one part number run
    /// one at a time, in call order.
    ///
    /// # Errors
    ///
    /// - `NoSuchUpload` if the session is completed or aborted
    /// - `InvalidArgument` if `part_number` is outside `1..=10000`
    /// - any error the service returns
    pub async fn upload_part(
        &self,
        client: &BosClient,
        part_number: u32,
        data: impl Into<Bytes>,
    ) -> BosResult<PartInfo> {
        self.ensure_accepting_parts()?;
        validate_part_number(part_number)?;

        let write_lock = Arc::clone(self.part_writes.entry(part_number).or_default().value());
        let _writing = write_lock.lock().await;
        self.ensure_accepting_parts()?;

        let data = data.into();
        let size = data.len() as u64;
        let local_etag = md5_hex(&data);
        let response = client
            .upload_part(UploadPartRequest {
                bucket: self.bucket.clone(),
                key: self.key.clone(),
                upload_id: self.upload_id.clone(),
                part_number,
                data,
            })
            .await?;

        let e_tag = if response.e_tag.is_empty() {
            local_etag
        } else {
            response.e_tag
        };
        let part = PartInfo {
            part_number,
            e_tag,
            size,
            last_modified: Utc::now(),
        };
        self.record_part(part.clone())?;
        Ok(part)
    }

    /// Complete the upload with the caller's full part list.
    ///
    /// The list is checked against the recorded parts before the request is
    /// sent; any failure leaves the session as it was.
    ///
    /// # Errors
    ///
    /// - `InvalidSessionState` if the session is terminal or has no parts
    /// - `InvalidPart` if the list is empty, repeats a part number, names an
    ///   unknown part or ETag, or leaves out a recorded part
    /// - `EntityTooSmall` if a non-final part is under the minimum size
    /// - any error the service returns
    pub async fn complete(
        &self,
        client: &BosClient,
        part_etags: Vec<PartETag>,
        metadata: ObjectMetadata,
    ) -> BosResult<CompleteMultipartUploadResponse> {
        let _finishing = self.finishing.lock().await;

        match self.status() {
            UploadStatus::Initiated => {
                return Err(BosError::invalid_session_state(format!(
                    "Upload {} has no parts to complete",
                    self.upload_id
                )));
            }
            status if status.is_terminal() => {
                return Err(BosError::invalid_session_state(format!(
                    "Upload {} is already {status}",
                    self.upload_id
                )));
            }
            _ => {}
        }
        validate_completion(&self.snapshot(), &part_etags, self.min_part_size)?;

        let response = client
            .complete_multipart_upload(CompleteMultipartUploadRequest {
                bucket: self.bucket.clone(),
                key: self.key.clone(),
                upload_id: self.upload_id.clone(),
                part_etags,
                metadata: metadata.clone(),
            })
            .await?;

        let mut final_metadata = self.metadata.clone();
        final_metadata.merge_missing_from(&metadata);
        final_metadata.e_tag = Some(response.e_tag.clone());

        *self.status.write() = UploadStatus::Completed;
        *self.completed.write() = Some(CompletedUpload {
            e_tag: response.e_tag.clone(),
            location: response.location.clone(),
            metadata: final_metadata,
        });
        info!(
            bucket = %self.bucket,
            key = %self.key,
            upload_id = %self.upload_id,
            e_tag = %response.e_tag,
            "Multipart upload completed"
        );
        Ok(response)
    }

    /// Abort the upload and discard the part inventory.
    ///
    /// # Errors
    ///
    /// - `InvalidSessionState` if the session is already terminal
    /// - any error the service returns
    pub async fn abort(&self, client: &BosClient) -> BosResult<()> {
        let _finishing = self.finishing.lock().await;

        let status = self.status();
        if status.is_terminal() {
            return Err(BosError::invalid_session_state(format!(
                "Upload {} is already {status}",
                self.upload_id
            )));
        }

        client
            .abort_multipart_upload(AbortMultipartUploadRequest {
                bucket: self.bucket.clone(),
                key: self.key.clone(),
                upload_id: self.upload_id.clone(),
            })
            .await?;

        let mut status = self.status.write();
        *status = UploadStatus::Aborted;
        self.parts.clear();
        self.part_writes.clear();
        drop(status);
        info!(upload_id = %self.upload_id, "Multipart upload aborted");
        Ok(())
    }

    /// Rebuild a session for an existing upload by paging through the
    /// service's part listing.
    ///
    /// # Errors
    ///
    /// Returns any error the service reports, e.g. `NoSuchUpload`.
    pub async fn resume(
        client: &BosClient,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> BosResult<Self> {
        let mut parts = Vec::new();
        let mut marker = None;
        loop {
            let page = client
                .list_parts(ListPartsRequest {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                    upload_id: upload_id.to_owned(),
                    part_number_marker: marker,
                    max_parts: None,
                })
                .await?;
            parts.extend(page.parts);
            if !page.is_truncated
                || page.next_part_number_marker >= MAX_PART_NUMBER
                || page.next_part_number_marker <= marker.unwrap_or(0)
            {
                break;
            }
            marker = Some(page.next_part_number_marker);
        }
        debug!(upload_id, part_count = parts.len(), "Resumed multipart upload");
        Ok(Self::from_parts(
            bucket,
            key,
            upload_id,
            client.config().min_part_size,
            parts,
        ))
    }

    fn ensure_accepting_parts(&self) -> BosResult<()> {
        if self.status().is_terminal() {
            return Err(BosError::no_such_upload(self.upload_id.clone()));
        }
        Ok(())
    }

    /// Record an acknowledged part unless the session finished meanwhile.
    fn record_part(&self, part: PartInfo) -> BosResult<()> {
        let status = self.status.read();
        if status.is_terminal() {
            return Err(BosError::no_such_upload(self.upload_id.clone()));
        }
        let part_number = part.part_number;
        self.parts.insert(part_number, part);
        let initiated = *status == UploadStatus::Initiated;
        drop(status);

        if initiated {
            let mut status = self.status.write();
            if *status == UploadStatus::Initiated {
                *status = UploadStatus::PartsUploading;
            }
        }
        debug!(upload_id = %self.upload_id, part_number, "Recorded part");
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<u32, PartInfo> {
        self.parts
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}
