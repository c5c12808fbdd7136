//! Object operation handlers.
//!
//! Implements `put_object`, `get_object` (with ranges), `head_object`,
//! `delete_object` and `copy_object`.

use std::str::FromStr;

use bcestack_bos_model::Body;
use bcestack_bos_model::checksum::validate_content_md5;
use bcestack_bos_model::headers::{CONTENT_MD5, COPY_SOURCE, METADATA_DIRECTIVE, quote_etag};
use bcestack_bos_model::output::CopyObjectResponse;
use bcestack_bos_model::types::{MetadataDirective, Permission};
use tracing::debug;

use crate::auth::Requester;
use crate::error::LocalServiceError;
use crate::provider::LocalBos;
use crate::router::BosRequest;
use crate::state::StoredObject;
use crate::utils::{parse_copy_source, parse_range_header};
use crate::validation::validate_object_key;

use super::{empty_response, json_response, metadata_from_request, set_header, set_object_headers};

impl LocalBos {
    /// Store an object. A declared `Content-Length` shorter than the body
    /// truncates it; a `Content-MD5` must match what is stored.
    pub(crate) fn handle_put_object(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        validate_object_key(key)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let mut data = req.body.clone();
        if let Some(declared) = req
            .header(http::header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse::<usize>().ok())
        {
            if declared < data.len() {
                data.truncate(declared);
            }
        }
        validate_content_md5(req.header(CONTENT_MD5), &data)?;

        let object = StoredObject::new(key, data, metadata_from_request(req));
        let e_tag = object.e_tag().to_owned();
        let size = object.size();
        bucket.put_object(object);

        debug!(bucket = %bucket_name, key = %key, size, e_tag = %e_tag, "put_object completed");
        let mut response = empty_response(http::StatusCode::OK);
        set_header(&mut response, http::header::ETAG.as_str(), &quote_etag(&e_tag));
        Ok(response)
    }

    /// Return an object, or the inclusive byte range named by `Range`. The
    /// body is streamed in chunks.
    pub(crate) fn handle_get_object(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let object = self.load_object(req)?;
        let size = object.size();

        let (status, data, content_range) = match req.header(http::header::RANGE.as_str()) {
            Some(range) => {
                let (start, end) = parse_range_header(range, size)?;
                let slice = object
                    .data
                    .slice(to_index(start)?..=to_index(end)?);
                (
                    http::StatusCode::PARTIAL_CONTENT,
                    slice,
                    Some(format!("bytes {start}-{end}/{size}")),
                )
            }
            None => (http::StatusCode::OK, object.data.clone(), None),
        };

        let length = data.len();
        let mut response = empty_response(status);
        *response.body_mut() = Body::chunked(data, self.config.response_chunk_size);
        set_object_headers(&mut response, &object);
        set_header(
            &mut response,
            http::header::CONTENT_LENGTH.as_str(),
            &length.to_string(),
        );
        if let Some(content_range) = content_range {
            set_header(&mut response, http::header::CONTENT_RANGE.as_str(), &content_range);
        }
        Ok(response)
    }

    /// Return an object's headers without its content.
    pub(crate) fn handle_head_object(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let object = self.load_object(req)?;
        let mut response = empty_response(http::StatusCode::OK);
        set_object_headers(&mut response, &object);
        set_header(
            &mut response,
            http::header::CONTENT_LENGTH.as_str(),
            &object.size().to_string(),
        );
        Ok(response)
    }

    /// Delete an object.
    pub(crate) fn handle_delete_object(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        self.state
            .get_bucket(bucket_name)?
            .delete_object(key)
            .ok_or_else(|| LocalServiceError::NoSuchKey {
                key: key.to_owned(),
            })?;
        debug!(bucket = %bucket_name, key = %key, "delete_object completed");
        Ok(empty_response(http::StatusCode::OK))
    }

    /// Copy an object named by `x-bce-copy-source`. With the `replace`
    /// directive the copy takes the request's metadata; the content type
    /// falls back to the source's when the request sends none.
    pub(crate) fn handle_copy_object(
        &self,
        req: &BosRequest,
        requester: &Requester,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        validate_object_key(key)?;
        let source = req
            .header(COPY_SOURCE)
            .ok_or_else(|| LocalServiceError::InvalidArgument {
                message: format!("{COPY_SOURCE} is required"),
            })?;
        let (source_bucket, source_key) = parse_copy_source(source)?;
        let directive = req
            .header(METADATA_DIRECTIVE)
            .map(MetadataDirective::from_str)
            .transpose()
            .map_err(|message| LocalServiceError::InvalidArgument { message })?
            .unwrap_or_default();

        let source_object = {
            let bucket = self.state.get_bucket(&source_bucket)?;
            if requester.is_anonymous() && !bucket.allows(None, Permission::Read) {
                return Err(LocalServiceError::AccessDenied {
                    message: format!("anonymous requests may not read {source_bucket}"),
                });
            }
            bucket
                .get_object(&source_key)
                .ok_or_else(|| LocalServiceError::NoSuchKey {
                    key: source_key.clone(),
                })?
        };

        let metadata = match directive {
            MetadataDirective::Copy => source_object.metadata.clone(),
            MetadataDirective::Replace => {
                let mut metadata = metadata_from_request(req);
                if metadata.content_type.is_none() {
                    metadata
                        .content_type
                        .clone_from(&source_object.metadata.content_type);
                }
                metadata
            }
        };
        let copy = StoredObject::with_etag(
            key,
            source_object.data.clone(),
            metadata,
            source_object.e_tag().to_owned(),
        );
        let response = CopyObjectResponse {
            e_tag: copy.e_tag().to_owned(),
            last_modified: copy.last_modified(),
        };
        self.state.get_bucket(bucket_name)?.put_object(copy);

        debug!(
            source = %format!("{source_bucket}/{source_key}"),
            target = %format!("{bucket_name}/{key}"),
            directive = directive.as_str(),
            "copy_object completed"
        );
        json_response(&response)
    }

    fn load_object(&self, req: &BosRequest) -> Result<StoredObject, LocalServiceError> {
        let (bucket_name, key) = req.require_object()?;
        self.state
            .get_bucket(bucket_name)?
            .get_object(key)
            .ok_or_else(|| LocalServiceError::NoSuchKey {
                key: key.to_owned(),
            })
    }
}

fn to_index(offset: u64) -> Result<usize, LocalServiceError> {
    usize::try_from(offset).map_err(|_| LocalServiceError::InvalidRange)
}
