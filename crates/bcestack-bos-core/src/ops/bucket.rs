//! Bucket operations.
//!
//! Implements `create_bucket`, `delete_bucket`, `does_bucket_exist`,
//! `list_buckets`, `get_bucket_location`, `set_bucket_acl` and
//! `get_bucket_acl`.

use bcestack_bos_model::headers::ACL;
use bcestack_bos_model::input::{AccessControlListBody, AclSource, SetBucketAclRequest};
use bcestack_bos_model::output::{GetBucketAclResponse, GetBucketLocationResponse, ListBucketsResponse};
use bcestack_bos_model::{Body, BosError, BosErrorCode, BosResult};
use tracing::info;

use crate::client::{BosClient, OperationRequest};

impl BosClient {
    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBucketName`, `BucketAlreadyExists` or any other
    /// service error.
    pub async fn create_bucket(&self, bucket: &str) -> BosResult<()> {
        self.execute(OperationRequest::new(http::Method::PUT).bucket(bucket))
            .await?;
        info!(bucket, "Bucket created");
        Ok(())
    }

    /// Delete an empty bucket.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchBucket`, `BucketNotEmpty` or any other service error.
    pub async fn delete_bucket(&self, bucket: &str) -> BosResult<()> {
        self.execute(OperationRequest::new(http::Method::DELETE).bucket(bucket))
            .await?;
        info!(bucket, "Bucket deleted");
        Ok(())
    }

    /// Whether a bucket exists. A bucket the caller may not access exists.
    ///
    /// # Errors
    ///
    /// Returns service errors other than `NoSuchBucket` and `AccessDenied`.
    pub async fn does_bucket_exist(&self, bucket: &str) -> BosResult<bool> {
        match self
            .execute(OperationRequest::new(http::Method::HEAD).bucket(bucket))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.code == BosErrorCode::NoSuchBucket => Ok(false),
            Err(e) if e.code == BosErrorCode::AccessDenied => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// List the caller's buckets.
    ///
    /// # Errors
    ///
    /// Returns any service error.
    pub async fn list_buckets(&self) -> BosResult<ListBucketsResponse> {
        self.execute_json(OperationRequest::new(http::Method::GET))
            .await
    }

    /// The region a bucket lives in.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchBucket` or any other service error.
    pub async fn get_bucket_location(&self, bucket: &str) -> BosResult<GetBucketLocationResponse> {
        self.execute_json(
            OperationRequest::new(http::Method::GET)
                .bucket(bucket)
                .query("location", ""),
        )
        .await
    }

    /// Replace a bucket's ACL, either with a canned ACL or a JSON grant list.
    ///
    /// A caller-supplied JSON document is sent verbatim, so a malformed one
    /// is judged by the service.
    ///
    /// # Errors
    ///
    /// Returns `MalformedJson`, `NoSuchBucket` or any other service error.
    pub async fn set_bucket_acl(&self, request: SetBucketAclRequest) -> BosResult<()> {
        let op = OperationRequest::new(http::Method::PUT)
            .bucket(&request.bucket)
            .query("acl", "");
        let op = match request.acl {
            AclSource::Canned(acl) => op.header(ACL, acl.as_str()),
            AclSource::Grants(grants) => {
                let payload = serde_json::to_vec(&AccessControlListBody {
                    access_control_list: grants,
                })
                .map_err(|e| BosError::internal(format!("Failed to encode ACL: {e}")).with_source(e))?;
                json_body(op, payload)
            }
            AclSource::Json(document) => json_body(op, document.into_bytes()),
        };
        self.execute(op).await?;
        info!(bucket = %request.bucket, "Bucket ACL updated");
        Ok(())
    }

    /// Read a bucket's ACL.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchBucket` or any other service error.
    pub async fn get_bucket_acl(&self, bucket: &str) -> BosResult<GetBucketAclResponse> {
        self.execute_json(
            OperationRequest::new(http::Method::GET)
                .bucket(bucket)
                .query("acl", ""),
        )
        .await
    }
}

fn json_body(op: OperationRequest, payload: Vec<u8>) -> OperationRequest {
    op.header(
        http::header::CONTENT_TYPE.as_str(),
        mime::APPLICATION_JSON.to_string(),
    )
    .body(Body::from(payload))
}
