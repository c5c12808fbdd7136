//! Bucket operation handlers.
//!
//! Implements `list_buckets`, `create_bucket`, `delete_bucket`,
//! `head_bucket`, `get_bucket_location`, `put_bucket_acl` and
//! `get_bucket_acl`.

use std::str::FromStr;

use bcestack_bos_model::Body;
use bcestack_bos_model::headers::ACL;
use bcestack_bos_model::input::AccessControlListBody;
use bcestack_bos_model::output::{GetBucketAclResponse, GetBucketLocationResponse, ListBucketsResponse};
use bcestack_bos_model::types::{CannedAcl, Grant};
use tracing::{debug, info};

use crate::error::LocalServiceError;
use crate::provider::LocalBos;
use crate::router::BosRequest;
use crate::validation::validate_bucket_name;

use super::{empty_response, json_response};

impl LocalBos {
    /// List every bucket.
    pub(crate) fn handle_list_buckets(&self) -> Result<http::Response<Body>, LocalServiceError> {
        json_response(&ListBucketsResponse {
            owner: self.owner(),
            buckets: self.state.list_buckets(),
        })
    }

    /// Create a bucket, applying a canned ACL from `x-bce-acl` if present.
    pub(crate) fn handle_create_bucket(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let bucket_name = req.require_bucket()?;
        validate_bucket_name(bucket_name)?;
        let canned = req.header(ACL).map(parse_canned_acl).transpose()?;

        self.state.create_bucket(
            bucket_name.to_owned(),
            self.config.region.clone(),
            self.owner(),
        )?;
        if let Some(canned) = canned {
            self.state
                .get_bucket(bucket_name)?
                .set_grants(canned.to_grants(&self.config.owner_id));
        }

        debug!(bucket = %bucket_name, "create_bucket completed");
        Ok(empty_response(http::StatusCode::OK))
    }

    /// Delete an empty bucket.
    pub(crate) fn handle_delete_bucket(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let bucket_name = req.require_bucket()?;
        self.state.delete_bucket(bucket_name)?;
        debug!(bucket = %bucket_name, "delete_bucket completed");
        Ok(empty_response(http::StatusCode::OK))
    }

    /// Check that a bucket exists.
    pub(crate) fn handle_head_bucket(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        self.state.get_bucket(req.require_bucket()?)?;
        Ok(empty_response(http::StatusCode::OK))
    }

    /// The region a bucket was created in.
    pub(crate) fn handle_get_bucket_location(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let location_constraint = self.state.get_bucket(req.require_bucket()?)?.region.clone();
        json_response(&GetBucketLocationResponse { location_constraint })
    }

    /// Replace a bucket ACL from either the `x-bce-acl` header or a JSON
    /// grant list.
    pub(crate) fn handle_put_bucket_acl(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let bucket_name = req.require_bucket()?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let grants = match req.header(ACL) {
            Some(canned) => parse_canned_acl(canned)?.to_grants(&self.config.owner_id),
            None => parse_grants(&req.body)?,
        };
        bucket.set_grants(grants);

        info!(bucket = %bucket_name, "bucket ACL updated");
        Ok(empty_response(http::StatusCode::OK))
    }

    /// Read a bucket ACL.
    pub(crate) fn handle_get_bucket_acl(
        &self,
        req: &BosRequest,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let bucket = self.state.get_bucket(req.require_bucket()?)?;
        let response = GetBucketAclResponse {
            owner: bucket.owner.clone(),
            access_control_list: bucket.grants(),
        };
        drop(bucket);
        json_response(&response)
    }
}

fn parse_canned_acl(value: &str) -> Result<CannedAcl, LocalServiceError> {
    CannedAcl::from_str(value).map_err(|message| LocalServiceError::InvalidArgument { message })
}

/// Decode a JSON ACL document. An empty body, `{}` and broken JSON are all
/// malformed.
fn parse_grants(body: &[u8]) -> Result<Vec<Grant>, LocalServiceError> {
    if body.is_empty() {
        return Err(LocalServiceError::MalformedJson {
            message: "the ACL document is empty".to_owned(),
        });
    }
    let document: AccessControlListBody =
        serde_json::from_slice(body).map_err(|e| LocalServiceError::MalformedJson {
            message: e.to_string(),
        })?;
    Ok(document.access_control_list)
}
