//! BOS request routing: path-style resolution and operation identification.
//!
//! [`route`] maps a [`BosRequest`] to a [`BosOperation`] by examining:
//!
//! - The HTTP method (GET, PUT, DELETE, POST, HEAD)
//! - Whether a bucket name and an object key are present in the path
//! - Sub-resource query parameters (`uploads`, `uploadId`, `partNumber`,
//!   `acl`, `location`)
//! - The `x-bce-copy-source` header, which turns a PUT into a copy

use std::fmt;

use bcestack_auth::canonical::{header_pairs, parse_query_string, uri_decode};
use bcestack_bos_model::Body;
use bcestack_bos_model::headers::{COPY_SOURCE, header_str};
use bcestack_bos_model::types::Permission;
use bytes::Bytes;
use http::Method;

use crate::error::LocalServiceError;

/// The operations the local service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BosOperation {
    /// `GET /`
    ListBuckets,
    /// `PUT /bucket`
    CreateBucket,
    /// `DELETE /bucket`
    DeleteBucket,
    /// `HEAD /bucket`
    HeadBucket,
    /// `GET /bucket?location`
    GetBucketLocation,
    /// `PUT /bucket?acl`
    PutBucketAcl,
    /// `GET /bucket?acl`
    GetBucketAcl,
    /// `GET /bucket?uploads`
    ListMultipartUploads,
    /// `PUT /bucket/key`
    PutObject,
    /// `PUT /bucket/key` with `x-bce-copy-source`
    CopyObject,
    /// `GET /bucket/key`
    GetObject,
    /// `HEAD /bucket/key`
    HeadObject,
    /// `DELETE /bucket/key`
    DeleteObject,
    /// `POST /bucket/key?uploads`
    InitiateMultipartUpload,
    /// `PUT /bucket/key?partNumber&uploadId`
    UploadPart,
    /// `POST /bucket/key?uploadId`
    CompleteMultipartUpload,
    /// `DELETE /bucket/key?uploadId`
    AbortMultipartUpload,
    /// `GET /bucket/key?uploadId`
    ListParts,
}

impl BosOperation {
    /// Operation name, for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBuckets => "ListBuckets",
            Self::CreateBucket => "CreateBucket",
            Self::DeleteBucket => "DeleteBucket",
            Self::HeadBucket => "HeadBucket",
            Self::GetBucketLocation => "GetBucketLocation",
            Self::PutBucketAcl => "PutBucketAcl",
            Self::GetBucketAcl => "GetBucketAcl",
            Self::ListMultipartUploads => "ListMultipartUploads",
            Self::PutObject => "PutObject",
            Self::CopyObject => "CopyObject",
            Self::GetObject => "GetObject",
            Self::HeadObject => "HeadObject",
            Self::DeleteObject => "DeleteObject",
            Self::InitiateMultipartUpload => "InitiateMultipartUpload",
            Self::UploadPart => "UploadPart",
            Self::CompleteMultipartUpload => "CompleteMultipartUpload",
            Self::AbortMultipartUpload => "AbortMultipartUpload",
            Self::ListParts => "ListParts",
        }
    }

    /// The bucket permission an anonymous requester needs, or `None` for
    /// operations reserved to authenticated accounts.
    #[must_use]
    pub fn anonymous_permission(&self) -> Option<Permission> {
        match self {
            Self::ListBuckets
            | Self::CreateBucket
            | Self::DeleteBucket
            | Self::PutBucketAcl
            | Self::GetBucketAcl => None,
            Self::HeadBucket
            | Self::GetBucketLocation
            | Self::ListMultipartUploads
            | Self::GetObject
            | Self::HeadObject
            | Self::ListParts => Some(Permission::Read),
            Self::PutObject
            | Self::CopyObject
            | Self::DeleteObject
            | Self::InitiateMultipartUpload
            | Self::UploadPart
            | Self::CompleteMultipartUpload
            | Self::AbortMultipartUpload => Some(Permission::Write),
        }
    }
}

impl fmt::Display for BosOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request with its body read and its path and query decoded.
#[derive(Debug, Clone)]
pub struct BosRequest {
    /// HTTP method.
    pub method: Method,
    /// Decoded path, `/bucket/key`.
    pub path: String,
    /// Decoded bucket name, if any.
    pub bucket: Option<String>,
    /// Decoded object key, if any.
    pub key: Option<String>,
    /// Decoded query parameters in request order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: http::HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl BosRequest {
    /// Read the body of `request` and decode its path and query.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServiceError::Internal`] if the body stream fails.
    pub async fn from_http(request: http::Request<Body>) -> Result<Self, LocalServiceError> {
        let (parts, body) = request.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| anyhow::anyhow!("failed to read request body: {e}"))?;

        let path = uri_decode(parts.uri.path());
        let (bucket, key) = parse_path(parts.uri.path());
        let query = parse_query_string(parts.uri.query().unwrap_or(""));

        Ok(Self {
            method: parts.method,
            path,
            bucket,
            key,
            query,
            headers: parts.headers,
            body,
        })
    }

    /// Whether the query carries `name`, with or without a value.
    #[must_use]
    pub fn has_query(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }

    /// The value of the query parameter `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// A header value, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// The headers as owned pairs, for signature verification.
    #[must_use]
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        header_pairs(&self.headers)
    }

    /// The bucket, or `InvalidArgument` when the path names none.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServiceError::InvalidArgument`] without a bucket.
    pub fn require_bucket(&self) -> Result<&str, LocalServiceError> {
        self.bucket
            .as_deref()
            .ok_or_else(|| LocalServiceError::InvalidArgument {
                message: "Request names no bucket".to_owned(),
            })
    }

    /// The bucket and key, or `InvalidArgument` when the path lacks either.
    ///
    /// # Errors
    ///
    /// Returns [`LocalServiceError::InvalidArgument`] without a key.
    pub fn require_object(&self) -> Result<(&str, &str), LocalServiceError> {
        let bucket = self.require_bucket()?;
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| LocalServiceError::InvalidArgument {
                message: "Request names no object key".to_owned(),
            })?;
        Ok((bucket, key))
    }
}

/// Parse the raw URI path into an optional bucket and an optional key.
///
/// Path format: `/{bucket}` or `/{bucket}/{key...}`.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    match trimmed.split_once('/') {
        Some((bucket, key)) => {
            let key = (!key.is_empty()).then(|| uri_decode(key));
            (Some(uri_decode(bucket)), key)
        }
        None => (Some(uri_decode(trimmed)), None),
    }
}

/// Identify the operation a request asks for.
///
/// # Errors
///
/// Returns [`LocalServiceError::MethodNotAllowed`] when no operation matches.
pub fn route(request: &BosRequest) -> Result<BosOperation, LocalServiceError> {
    let not_allowed = || LocalServiceError::MethodNotAllowed {
        method: request.method.to_string(),
    };

    match (request.bucket.is_some(), request.key.is_some()) {
        (false, _) => match request.method {
            Method::GET => Ok(BosOperation::ListBuckets),
            _ => Err(not_allowed()),
        },
        (true, false) => identify_bucket_operation(request).ok_or_else(not_allowed),
        (true, true) => identify_object_operation(request).ok_or_else(not_allowed),
    }
}

/// Identify a bucket-level operation (bucket present, no key).
fn identify_bucket_operation(request: &BosRequest) -> Option<BosOperation> {
    match request.method {
        Method::GET if request.has_query("acl") => Some(BosOperation::GetBucketAcl),
        Method::GET if request.has_query("location") => Some(BosOperation::GetBucketLocation),
        Method::GET if request.has_query("uploads") => Some(BosOperation::ListMultipartUploads),
        Method::PUT if request.has_query("acl") => Some(BosOperation::PutBucketAcl),
        Method::PUT => Some(BosOperation::CreateBucket),
        Method::DELETE => Some(BosOperation::DeleteBucket),
        Method::HEAD => Some(BosOperation::HeadBucket),
        _ => None,
    }
}

/// Identify an object-level operation (bucket and key present).
fn identify_object_operation(request: &BosRequest) -> Option<BosOperation> {
    let has_upload_id = request.has_query("uploadId");
    match request.method {
        Method::GET if has_upload_id => Some(BosOperation::ListParts),
        Method::GET => Some(BosOperation::GetObject),
        Method::HEAD => Some(BosOperation::HeadObject),
        Method::PUT if has_upload_id && request.has_query("partNumber") => {
            Some(BosOperation::UploadPart)
        }
        Method::PUT if request.header(COPY_SOURCE).is_some() => Some(BosOperation::CopyObject),
        Method::PUT => Some(BosOperation::PutObject),
        Method::POST if request.has_query("uploads") => Some(BosOperation::InitiateMultipartUpload),
        Method::POST if has_upload_id => Some(BosOperation::CompleteMultipartUpload),
        Method::DELETE if has_upload_id => Some(BosOperation::AbortMultipartUpload),
        Method::DELETE => Some(BosOperation::DeleteObject),
        _ => None,
    }
}
