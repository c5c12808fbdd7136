//! Per-operation request types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::types::{CannedAcl, Grant, ObjectMetadata, PartETag};

/// BOS PutObject request.
#[derive(Debug, Default)]
pub struct PutObjectRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
    /// Object content, buffered or streamed.
    pub body: Body,
    /// Content headers and user metadata. `content_length` truncates the body.
    pub metadata: ObjectMetadata,
}

impl PutObjectRequest {
    /// Create a request with default metadata.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, body: impl Into<Body>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            body: body.into(),
            metadata: ObjectMetadata::default(),
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// BOS GetObject request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
    /// Inclusive byte range `[start, end]`.
    pub range: Option<(u64, u64)>,
}

impl GetObjectRequest {
    /// Fetch the whole object.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            range: None,
        }
    }

    /// Fetch only bytes `start..=end`.
    #[must_use]
    pub fn with_range(mut self, start: u64, end: u64) -> Self {
        self.range = Some((start, end));
        self
    }
}

/// BOS GetObjectMetadata (HEAD object) request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectMetadataRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
}

/// BOS CopyObject request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyObjectRequest {
    /// Header `x-bce-copy-source`: source bucket.
    pub source_bucket: String,
    /// Header `x-bce-copy-source`: source key.
    pub source_key: String,
    /// URI path: target bucket.
    pub target_bucket: String,
    /// URI path: target key.
    pub target_key: String,
    /// When set, replaces the source metadata instead of copying it.
    pub new_metadata: Option<ObjectMetadata>,
}

/// BOS DeleteObject request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteObjectRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
}

/// BOS InitiateMultipartUpload request (`POST ?uploads`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitiateMultipartUploadRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
    /// Metadata of the final object.
    pub metadata: ObjectMetadata,
}

/// BOS UploadPart request (`PUT ?partNumber&uploadId`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPartRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
    /// Query: `uploadId`.
    pub upload_id: String,
    /// Query: `partNumber`, `1..=10000`.
    pub part_number: u32,
    /// Part content. Buffered so its MD5 can be sent as `Content-MD5`.
    pub data: Bytes,
}

/// BOS CompleteMultipartUpload request (`POST ?uploadId`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompleteMultipartUploadRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
    /// Query: `uploadId`.
    pub upload_id: String,
    /// Every uploaded part, in any order.
    pub part_etags: Vec<PartETag>,
    /// Metadata filling what the initiation left unset.
    pub metadata: ObjectMetadata,
}

/// JSON payload of a completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteMultipartUploadBody {
    /// The listed parts.
    pub parts: Vec<PartETag>,
}

/// BOS AbortMultipartUpload request (`DELETE ?uploadId`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbortMultipartUploadRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
    /// Query: `uploadId`.
    pub upload_id: String,
}

/// BOS ListParts request (`GET ?uploadId`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPartsRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// URI path: key.
    pub key: String,
    /// Query: `uploadId`.
    pub upload_id: String,
    /// Query: `partNumberMarker`. Parts numbered above it are listed.
    pub part_number_marker: Option<u32>,
    /// Query: `maxParts`, capped at 1000.
    pub max_parts: Option<u32>,
}

/// BOS ListMultipartUploads request (`GET /bucket?uploads`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMultipartUploadsRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// Query: `keyMarker`. Uploads for keys above it are listed.
    pub key_marker: Option<String>,
    /// Query: `uploadIdMarker`. With `key_marker`, also lists uploads of
    /// that key whose ids sort above this one.
    pub upload_id_marker: Option<String>,
    /// Query: `maxUploads`, capped at 1000.
    pub max_uploads: Option<u32>,
    /// Query: `prefix`.
    pub prefix: Option<String>,
}

/// How a SetBucketAcl request expresses the ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclSource {
    /// A canned ACL in the `x-bce-acl` header.
    Canned(CannedAcl),
    /// An explicit grant list, serialized as JSON.
    Grants(Vec<Grant>),
    /// A caller-supplied JSON document, sent verbatim.
    Json(String),
}

/// BOS SetBucketAcl request (`PUT ?acl`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBucketAclRequest {
    /// URI path: bucket.
    pub bucket: String,
    /// The ACL to apply.
    pub acl: AclSource,
}

/// JSON payload of an ACL write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlListBody {
    /// The grants.
    pub access_control_list: Vec<Grant>,
}

/// Request for a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratePresignedUrlRequest {
    /// Bucket.
    pub bucket: String,
    /// Key; empty for bucket-level URLs.
    pub key: String,
    /// Method the URL authorizes.
    pub method: http::Method,
    /// Validity window; the client default applies when `None`.
    pub expiration_seconds: Option<u32>,
    /// Extra headers the fetch must send; each one is signed.
    pub headers: Vec<(String, String)>,
    /// Extra query parameters, signed along with the authorization ones.
    pub query: Vec<(String, String)>,
}

impl GeneratePresignedUrlRequest {
    /// A presigned GET for an object.
    #[must_use]
    pub fn get(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            method: http::Method::GET,
            expiration_seconds: None,
            headers: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Set the validity window.
    #[must_use]
    pub fn with_expiration(mut self, expiration_seconds: u32) -> Self {
        self.expiration_seconds = Some(expiration_seconds);
        self
    }
}
