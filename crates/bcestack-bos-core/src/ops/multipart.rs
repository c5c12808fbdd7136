//! Multipart upload operations.
//!
//! The wire-level calls (`initiate_multipart_upload`, `upload_part`,
//! `list_parts`, `complete_multipart_upload`, `abort_multipart_upload`,
//! `list_multipart_uploads`) plus the session entry points that wrap them in
//! an [`UploadSession`].

use bcestack_bos_model::checksum::{md5_base64, md5_hex};
use bcestack_bos_model::headers::{CONTENT_MD5, metadata_to_headers};
use bcestack_bos_model::input::{
    AbortMultipartUploadRequest, CompleteMultipartUploadBody, CompleteMultipartUploadRequest,
    InitiateMultipartUploadRequest, ListMultipartUploadsRequest, ListPartsRequest,
    UploadPartRequest,
};
use bcestack_bos_model::multipart::validate_part_number;
use bcestack_bos_model::output::{
    CompleteMultipartUploadResponse, InitiateMultipartUploadResponse,
    ListMultipartUploadsResponse, ListPartsResponse, UploadPartResponse,
};
use bcestack_bos_model::{Body, BosError, BosResult, ObjectMetadata};
use tracing::{debug, info};

use crate::client::{BosClient, OperationRequest};
use crate::mimetypes::content_type_for_key;
use crate::ops::object::etag_of;
use crate::session::UploadSession;

impl BosClient {
    /// Start a multipart upload (`POST ?uploads`). The content type defaults
    /// from the key extension.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchBucket` or any other service error.
    pub async fn initiate_multipart_upload(
        &self,
        request: InitiateMultipartUploadRequest,
    ) -> BosResult<InitiateMultipartUploadResponse> {
        let mut metadata = request.metadata;
        if metadata.content_type.is_none() {
            metadata.content_type = Some(content_type_for_key(&request.key).to_string());
        }
        let op = OperationRequest::new(http::Method::POST)
            .object(&request.bucket, &request.key)
            .query("uploads", "")
            .headers(metadata_to_headers(&metadata));
        let response: InitiateMultipartUploadResponse = self.execute_json(op).await?;
        info!(
            bucket = %response.bucket,
            key = %response.key,
            upload_id = %response.upload_id,
            "Multipart upload initiated"
        );
        Ok(response)
    }

    /// Upload one part (`PUT ?partNumber&uploadId`), sending the part's MD5
    /// as `Content-MD5`. The returned ETag falls back to the local MD5 when
    /// the service sends none.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a part number outside `1..=10000`, before any
    ///   network call
    /// - `NoSuchUpload`, `BadDigest` or any other service error
    pub async fn upload_part(&self, request: UploadPartRequest) -> BosResult<UploadPartResponse> {
        validate_part_number(request.part_number)?;

        let op = OperationRequest::new(http::Method::PUT)
            .object(&request.bucket, &request.key)
            .query("partNumber", request.part_number.to_string())
            .query("uploadId", request.upload_id.as_str())
            .header(CONTENT_MD5, md5_base64(&request.data))
            .header(
                http::header::CONTENT_TYPE.as_str(),
                mime::APPLICATION_OCTET_STREAM.to_string(),
            );
        let local_etag = md5_hex(&request.data);
        let response = self.execute(op.body(Body::from(request.data))).await?;

        let mut e_tag = etag_of(&response);
        if e_tag.is_empty() {
            e_tag = local_etag;
        }
        debug!(
            upload_id = %request.upload_id,
            part_number = request.part_number,
            e_tag,
            "upload_part completed"
        );
        Ok(UploadPartResponse {
            part_number: request.part_number,
            e_tag,
        })
    }

    /// List the parts the service holds for an upload (`GET ?uploadId`).
    ///
    /// # Errors
    ///
    /// Returns `NoSuchUpload` or any other service error.
    pub async fn list_parts(&self, request: ListPartsRequest) -> BosResult<ListPartsResponse> {
        let op = OperationRequest::new(http::Method::GET)
            .object(&request.bucket, &request.key)
            .query("uploadId", request.upload_id.as_str())
            .query_opt("partNumberMarker", request.part_number_marker)
            .query_opt("maxParts", request.max_parts);
        self.execute_json(op).await
    }

    /// Assemble an upload from its parts (`POST ?uploadId`).
    ///
    /// `metadata` fills whatever the initiation left unset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPart`, `EntityTooSmall`, `NoSuchUpload` or any other
    /// service error.
    pub async fn complete_multipart_upload(
        &self,
        request: CompleteMultipartUploadRequest,
    ) -> BosResult<CompleteMultipartUploadResponse> {
        let payload = serde_json::to_vec(&CompleteMultipartUploadBody {
            parts: request.part_etags,
        })
        .map_err(|e| BosError::internal(format!("Failed to encode part list: {e}")).with_source(e))?;

        let op = OperationRequest::new(http::Method::POST)
            .object(&request.bucket, &request.key)
            .query("uploadId", request.upload_id.as_str())
            .headers(metadata_to_headers(&request.metadata))
            .body(Body::from(payload));
        self.execute_json(op).await
    }

    /// Abandon an upload (`DELETE ?uploadId`).
    ///
    /// # Errors
    ///
    /// Returns `NoSuchUpload` or any other service error.
    pub async fn abort_multipart_upload(&self, request: AbortMultipartUploadRequest) -> BosResult<()> {
        let op = OperationRequest::new(http::Method::DELETE)
            .object(&request.bucket, &request.key)
            .query("uploadId", request.upload_id.as_str());
        self.execute(op).await?;
        Ok(())
    }

    /// List the active uploads of a bucket (`GET /bucket?uploads`).
    ///
    /// # Errors
    ///
    /// Returns `NoSuchBucket` or any other service error.
    pub async fn list_multipart_uploads(
        &self,
        request: ListMultipartUploadsRequest,
    ) -> BosResult<ListMultipartUploadsResponse> {
        let op = OperationRequest::new(http::Method::GET)
            .bucket(&request.bucket)
            .query("uploads", "")
            .query_opt("keyMarker", request.key_marker)
            .query_opt("uploadIdMarker", request.upload_id_marker)
            .query_opt("maxUploads", request.max_uploads)
            .query_opt("prefix", request.prefix);
        self.execute_json(op).await
    }

    /// Initiate an upload and wrap it in a session.
    ///
    /// # Errors
    ///
    /// See [`BosClient::initiate_multipart_upload`].
    pub async fn start_upload_session(
        &self,
        bucket: &str,
        key: &str,
        metadata: ObjectMetadata,
    ) -> BosResult<UploadSession> {
        let mut metadata = metadata;
        if metadata.content_type.is_none() {
            metadata.content_type = Some(content_type_for_key(key).to_string());
        }
        let response = self
            .initiate_multipart_upload(InitiateMultipartUploadRequest {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                metadata: metadata.clone(),
            })
            .await?;
        Ok(UploadSession::new(
            response.bucket,
            response.key,
            response.upload_id,
            metadata,
            self.config().min_part_size,
        ))
    }

    /// Rebuild a session for an upload started elsewhere.
    ///
    /// # Errors
    ///
    /// See [`UploadSession::resume`].
    pub async fn resume_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> BosResult<UploadSession> {
        UploadSession::resume(self, bucket, key, upload_id).await
    }
}
