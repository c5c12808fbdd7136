//! Per-operation response types.
//!
//! Responses read from headers are plain structs; responses carried as JSON
//! derive serde with the camelCase field names of the BOS wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::types::{BucketSummary, Grant, ObjectMetadata, Owner, PartInfo, UploadSummary};

/// BOS PutObject response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectResponse {
    /// Header `ETag`, unquoted.
    pub e_tag: String,
}

/// BOS GetObject response.
#[derive(Debug, Default)]
pub struct GetObjectResponse {
    /// Object metadata from the response headers. For ranged reads,
    /// `content_length` is the length of the returned range.
    pub metadata: ObjectMetadata,
    /// Header `Content-Range`, for ranged reads.
    pub content_range: Option<String>,
    /// Object content, streamed.
    pub body: Body,
}

/// BOS GetObjectMetadata response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectMetadataResponse {
    /// Object metadata from the response headers.
    pub metadata: ObjectMetadata,
}

/// BOS CopyObject response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyObjectResponse {
    /// ETag of the new object.
    pub e_tag: String,
    /// Modification time of the new object.
    pub last_modified: DateTime<Utc>,
}

/// BOS InitiateMultipartUpload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateMultipartUploadResponse {
    /// Bucket.
    pub bucket: String,
    /// Key.
    pub key: String,
    /// Opaque upload id.
    pub upload_id: String,
}

/// BOS UploadPart response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPartResponse {
    /// The part number uploaded.
    pub part_number: u32,
    /// Header `ETag`, unquoted.
    pub e_tag: String,
}

/// BOS CompleteMultipartUpload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartUploadResponse {
    /// URL of the assembled object.
    pub location: String,
    /// Bucket.
    pub bucket: String,
    /// Key.
    pub key: String,
    /// ETag of the assembled object.
    pub e_tag: String,
}

/// BOS ListParts response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPartsResponse {
    /// Bucket.
    pub bucket: String,
    /// Key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Initiation time.
    pub initiated: DateTime<Utc>,
    /// Initiator.
    pub owner: Owner,
    /// Storage class.
    #[serde(default)]
    pub storage_class: String,
    /// The marker this page starts after.
    pub part_number_marker: u32,
    /// The marker for the next page.
    pub next_part_number_marker: u32,
    /// Effective page size.
    pub max_parts: u32,
    /// Whether more parts follow.
    pub is_truncated: bool,
    /// Parts in ascending part-number order.
    pub parts: Vec<PartInfo>,
}

/// BOS ListMultipartUploads response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMultipartUploadsResponse {
    /// Bucket.
    pub bucket: String,
    /// The marker this page starts after.
    #[serde(default)]
    pub key_marker: String,
    /// The marker for the next page, when truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_key_marker: Option<String>,
    /// The upload id marker this page starts after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id_marker: Option<String>,
    /// The upload id marker for the next page, when truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_upload_id_marker: Option<String>,
    /// Prefix filter.
    #[serde(default)]
    pub prefix: String,
    /// Effective page size.
    pub max_uploads: u32,
    /// Whether more uploads follow.
    pub is_truncated: bool,
    /// Active uploads, ordered by key then upload id.
    pub uploads: Vec<UploadSummary>,
}

/// BOS ListBuckets response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBucketsResponse {
    /// Account owner.
    pub owner: Owner,
    /// Buckets ordered by name.
    pub buckets: Vec<BucketSummary>,
}

/// BOS GetBucketLocation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBucketLocationResponse {
    /// Region, e.g. `bj`.
    pub location_constraint: String,
}

/// BOS GetBucketAcl response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBucketAclResponse {
    /// Bucket owner.
    pub owner: Owner,
    /// Grants.
    pub access_control_list: Vec<Grant>,
}
