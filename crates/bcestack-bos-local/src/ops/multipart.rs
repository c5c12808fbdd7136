//! Multipart upload handlers.
//!
//! Implements `initiate_multipart_upload`, `upload_part`,
//! `complete_multipart_upload`, `abort_multipart_upload`, `list_parts` and
//! `list_multipart_uploads`. Uploads live in the bucket's upload table
//! until they are completed or aborted.

use bcestack_auth::canonical::build_canonical_uri;
use bcestack_bos_model::Body;
use bcestack_bos_model::checksum::{md5_hex, multipart_etag, validate_content_md5};
use bcestack_bos_model::headers::{CONTENT_MD5, quote_etag};
use bcestack_bos_model::input::CompleteMultipartUploadBody;
use bcestack_bos_model::multipart::{
    effective_max_entries, paginate_parts, validate_completion, validate_part_number,
};
use bcestack_bos_model::output::{
    CompleteMultipartUploadResponse, InitiateMultipartUploadResponse, ListMultipartUploadsResponse,
    ListPartsResponse,
};
use bcestack_bos_model::types::UploadSummary;
use tracing::{debug, info};

use crate::error::LocalServiceError;
use crate::provider::LocalBos;
use crate::router::BosRequest;
use crate::state::multipart::STORAGE_CLASS;
use crate::state::{MultipartUpload, StoredObject, UploadPart};
use crate::utils::generate_upload_id;
use crate::validation::validate_object_key;

use super::{empty_response, json_response, metadata_from_request, query_number, set_header};

impl LocalBos {
    /// Start an upload. The request's content type and user metadata are
    /// kept for the final object.
    pub(crate) fn handle_initiate_multipart_upload(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        validate_object_key(key)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let upload_id = generate_upload_id();
        let upload = MultipartUpload::new(
            upload_id.clone(),
            key.to_owned(),
            self.owner(),
            metadata_from_request(req),
        );
        bucket.multipart_uploads.insert(upload_id.clone(), upload);
        drop(bucket);

        info!(bucket = %bucket_name, key = %key, upload_id = %upload_id, "multipart upload initiated");
        json_response(&InitiateMultipartUploadResponse {
            bucket: bucket_name.to_owned(),
            key: key.to_owned(),
            upload_id,
        })
    }

    /// Store one part. Re-uploading a part number replaces the earlier part.
    pub(crate) fn handle_upload_part(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        let upload_id = required_upload_id(req)?;
        let part_number: u32 =
            query_number(req, "partNumber")?.ok_or_else(|| LocalServiceError::InvalidArgument {
                message: "partNumber is required".to_owned(),
            })?;
        validate_part_number(part_number)?;
        validate_content_md5(req.header(CONTENT_MD5), &req.body)?;

        let bucket = self.state.get_bucket(bucket_name)?;
        let mut upload = bucket
            .multipart_uploads
            .get_mut(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| no_such_upload(upload_id))?;

        let e_tag = md5_hex(&req.body);
        upload.put_part(UploadPart::new(part_number, e_tag.clone(), req.body.clone()));
        drop(upload);

        debug!(upload_id = %upload_id, part_number, e_tag = %e_tag, "upload_part completed");
        let mut response = empty_response(http::StatusCode::OK);
        set_header(&mut response, http::header::ETAG.as_str(), &quote_etag(&e_tag));
        Ok(response)
    }

    /// Assemble the listed parts into the final object and retire the
    /// upload. A rejected part list leaves the upload in place.
    pub(crate) fn handle_complete_multipart_upload(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        let upload_id = required_upload_id(req)?;
        let requested: CompleteMultipartUploadBody =
            serde_json::from_slice(&req.body).map_err(|e| LocalServiceError::MalformedJson {
                message: e.to_string(),
            })?;

        let bucket = self.state.get_bucket(bucket_name)?;
        let (data, metadata, e_tag) = {
            let upload = bucket
                .multipart_uploads
                .get(upload_id)
                .filter(|upload| upload.key == key)
                .ok_or_else(|| no_such_upload(upload_id))?;
            let parts = validate_completion(
                &upload.part_infos(),
                &requested.parts,
                self.config.min_part_size,
            )?;
            let e_tag = multipart_etag(parts.iter().map(|p| p.e_tag.as_str()));
            let mut metadata = upload.metadata.clone();
            metadata.merge_missing_from(&metadata_from_request(req));
            (upload.assemble(&parts), metadata, e_tag)
        };

        // A concurrent completion or abort may have won the race.
        bucket
            .multipart_uploads
            .remove(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;
        let size = data.len();
        bucket.put_object(StoredObject::with_etag(key, data, metadata, e_tag.clone()));
        drop(bucket);

        let host = req.header(http::header::HOST.as_str()).unwrap_or("localhost");
        let location = format!(
            "http://{host}{}",
            build_canonical_uri(&format!("/{bucket_name}/{key}"))
        );
        info!(
            bucket = %bucket_name,
            key = %key,
            upload_id = %upload_id,
            size,
            e_tag = %e_tag,
            "multipart upload completed"
        );
        json_response(&CompleteMultipartUploadResponse {
            location,
            bucket: bucket_name.to_owned(),
            key: key.to_owned(),
            e_tag,
        })
    }

    /// Discard an upload and its parts.
    pub(crate) fn handle_abort_multipart_upload(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        let upload_id = required_upload_id(req)?;
        self.state
            .get_bucket(bucket_name)?
            .multipart_uploads
            .remove_if(upload_id, |_, upload| upload.key == key)
            .ok_or_else(|| no_such_upload(upload_id))?;

        info!(bucket = %bucket_name, key = %key, upload_id = %upload_id, "multipart upload aborted");
        Ok(empty_response(http::StatusCode::OK))
    }

    /// Page through the parts of an upload.
    pub(crate) fn handle_list_parts(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        let upload_id = required_upload_id(req)?;
        let marker: u32 = query_number(req, "partNumberMarker")?.unwrap_or(0);
        let max_parts = effective_max_entries(query_number(req, "maxParts")?);

        let bucket = self.state.get_bucket(bucket_name)?;
        let upload = bucket
            .multipart_uploads
            .get(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| no_such_upload(upload_id))?;
        let page = paginate_parts(&upload.part_infos(), marker, max_parts);
        let response = ListPartsResponse {
            bucket: bucket_name.to_owned(),
            key: key.to_owned(),
            upload_id: upload_id.to_owned(),
            initiated: upload.initiated,
            owner: upload.owner.clone(),
            storage_class: STORAGE_CLASS.to_owned(),
            part_number_marker: marker,
            next_part_number_marker: page.next_part_number_marker,
            max_parts,
            is_truncated: page.is_truncated,
            parts: page.parts,
        };
        drop(upload);
        drop(bucket);

        json_response(&response)
    }

    /// List the uploads in progress, ordered by key then upload id. A page
    /// resumes after `keyMarker`, or after the `(keyMarker, uploadIdMarker)`
    /// pair when both are given.
    pub(crate) fn handle_list_multipart_uploads(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let bucket_name = req.require_bucket()?;
        let prefix = req.query_value("prefix").unwrap_or_default().to_owned();
        let key_marker = req.query_value("keyMarker").unwrap_or_default().to_owned();
        let upload_id_marker = req
            .query_value("uploadIdMarker")
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned);
        let max_uploads = effective_max_entries(query_number(req, "maxUploads")?);

        let mut uploads: Vec<UploadSummary> = self
            .state
            .get_bucket(bucket_name)?
            .multipart_uploads
            .iter()
            .map(|entry| entry.value().summary())
            .filter(|upload| upload.key.starts_with(&prefix))
            .filter(|upload| match &upload_id_marker {
                Some(id_marker) => {
                    (upload.key.as_str(), upload.upload_id.as_str())
                        > (key_marker.as_str(), id_marker.as_str())
                }
                None => upload.key > key_marker,
            })
            .collect();
        uploads.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.upload_id.cmp(&b.upload_id)));

        let is_truncated = uploads.len() > max_uploads as usize;
        uploads.truncate(max_uploads as usize);
        let (next_key_marker, next_upload_id_marker) = match uploads.last() {
            Some(last) if is_truncated => (Some(last.key.clone()), Some(last.upload_id.clone())),
            _ => (None, None),
        };

        json_response(&ListMultipartUploadsResponse {
            bucket: bucket_name.to_owned(),
            key_marker,
            next_key_marker,
            upload_id_marker,
            next_upload_id_marker,
            prefix,
            max_uploads,
            is_truncated,
            uploads,
        })
    }
}

fn required_upload_id(req: &BosRequest) -> Result<&str, LocalServiceError> {
    req.query_value("uploadId")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| LocalServiceError::InvalidArgument {
            message: "uploadId is required".to_owned(),
        })
}

fn no_such_upload(upload_id: &str) -> LocalServiceError {
    LocalServiceError::NoSuchUpload {
        upload_id: upload_id.to_owned(),
    }
}
