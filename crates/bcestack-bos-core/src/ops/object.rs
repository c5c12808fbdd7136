//! Object operations.
//!
//! Implements `put_object`, `get_object`, `get_object_content`,
//! `get_object_metadata`, `copy_object` and `delete_object`.

use bcestack_auth::canonical::build_canonical_uri;
use bcestack_bos_model::headers::{
    COPY_SOURCE, METADATA_DIRECTIVE, header_str, metadata_from_headers, metadata_to_headers,
    unquote_etag,
};
use bcestack_bos_model::input::{
    CopyObjectRequest, DeleteObjectRequest, GetObjectMetadataRequest, GetObjectRequest,
    PutObjectRequest,
};
use bcestack_bos_model::output::{
    CopyObjectResponse, GetObjectMetadataResponse, GetObjectResponse, PutObjectResponse,
};
use bcestack_bos_model::types::MetadataDirective;
use bcestack_bos_model::{BosError, BosErrorCode, BosResult};
use bytes::Bytes;
use tracing::debug;

use crate::client::{BosClient, OperationRequest};
use crate::mimetypes::content_type_for_key;

impl BosClient {
    /// Store an object.
    ///
    /// The content type defaults from the key extension. An explicit
    /// `metadata.content_length` shorter than the body truncates it.
    ///
    /// # Errors
    ///
    /// Returns any signing error, or the error the service reports.
    pub async fn put_object(&self, request: PutObjectRequest) -> BosResult<PutObjectResponse> {
        let PutObjectRequest {
            bucket,
            key,
            body,
            mut metadata,
        } = request;

        if metadata.content_type.is_none() {
            metadata.content_type = Some(content_type_for_key(&key).to_string());
        }
        let content_length = match (metadata.content_length, body.size_hint()) {
            (Some(declared), Some(actual)) => Some(declared.min(actual)),
            (declared, actual) => declared.or(actual),
        };
        let body = match metadata.content_length {
            Some(limit) => body.limit(limit),
            None => body,
        };

        let mut op = OperationRequest::new(http::Method::PUT)
            .object(&bucket, &key)
            .headers(metadata_to_headers(&metadata));
        if let Some(length) = content_length {
            op = op.header(http::header::CONTENT_LENGTH.as_str(), length.to_string());
        }

        let response = self.execute(op.body(body)).await?;
        let e_tag = etag_of(&response);
        debug!(bucket, key, e_tag, "put_object completed");
        Ok(PutObjectResponse { e_tag })
    }

    /// Fetch an object, optionally an inclusive byte range of it. The body
    /// is returned as a stream.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the range starts after it ends
    /// - `NoSuchKey`, `InvalidRange` or any other service error
    pub async fn get_object(&self, request: GetObjectRequest) -> BosResult<GetObjectResponse> {
        let mut op = OperationRequest::new(http::Method::GET).object(&request.bucket, &request.key);
        if let Some((start, end)) = request.range {
            if start > end {
                return Err(BosError::invalid_argument(format!(
                    "Range start {start} is after range end {end}"
                )));
            }
            op = op.header(http::header::RANGE.as_str(), format!("bytes={start}-{end}"));
        }

        let response = self.execute(op).await?;
        let metadata = metadata_from_headers(response.headers());
        let content_range =
            header_str(response.headers(), http::header::CONTENT_RANGE.as_str()).map(ToOwned::to_owned);
        Ok(GetObjectResponse {
            metadata,
            content_range,
            body: response.into_body(),
        })
    }

    /// Fetch a whole object into memory.
    ///
    /// # Errors
    ///
    /// Returns the error [`BosClient::get_object`] reports, or
    /// `TransportFailure` if the body stream fails.
    pub async fn get_object_content(&self, bucket: &str, key: &str) -> BosResult<Bytes> {
        let response = self.get_object(GetObjectRequest::new(bucket, key)).await?;
        response.body.collect().await.map_err(|e| {
            BosError::with_message(BosErrorCode::TransportFailure, e.to_string()).with_source(e)
        })
    }

    /// Read an object's metadata without its content.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchKey` or any other service error.
    pub async fn get_object_metadata(
        &self,
        request: GetObjectMetadataRequest,
    ) -> BosResult<GetObjectMetadataResponse> {
        let op = OperationRequest::new(http::Method::HEAD).object(&request.bucket, &request.key);
        let response = self.execute(op).await?;
        Ok(GetObjectMetadataResponse {
            metadata: metadata_from_headers(response.headers()),
        })
    }

    /// Copy an object. With `new_metadata`, the copy carries exactly that
    /// metadata instead of the source's.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchKey`, `NoSuchBucket` or any other service error.
    pub async fn copy_object(&self, request: CopyObjectRequest) -> BosResult<CopyObjectResponse> {
        let source = build_canonical_uri(&format!(
            "/{}/{}",
            request.source_bucket, request.source_key
        ));
        let mut op = OperationRequest::new(http::Method::PUT)
            .object(&request.target_bucket, &request.target_key)
            .header(COPY_SOURCE, source);
        op = match &request.new_metadata {
            Some(metadata) => op
                .header(METADATA_DIRECTIVE, MetadataDirective::Replace.as_str())
                .headers(metadata_to_headers(metadata)),
            None => op.header(METADATA_DIRECTIVE, MetadataDirective::Copy.as_str()),
        };
        self.execute_json(op).await
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchKey` or any other service error.
    pub async fn delete_object(&self, request: DeleteObjectRequest) -> BosResult<()> {
        let op = OperationRequest::new(http::Method::DELETE).object(&request.bucket, &request.key);
        self.execute(op).await?;
        debug!(bucket = %request.bucket, key = %request.key, "delete_object completed");
        Ok(())
    }
}

/// The unquoted `ETag` header of a response, or an empty string.
pub(crate) fn etag_of(response: &http::Response<bcestack_bos_model::Body>) -> String {
    header_str(response.headers(), http::header::ETAG.as_str())
        .map(|v| unquote_etag(v).to_owned())
        .unwrap_or_default()
}
