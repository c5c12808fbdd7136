//! The local BOS provider.
//!
//! [`LocalBos`] owns all service state and implements
//! [`bcestack_bos_model::Transport`], so a `BosClient` can talk to it
//! directly. Each request is decoded, authenticated, routed, authorized and
//! handed to a `handle_*` method of the `ops` module; errors come back as BOS
//! JSON error bodies.

use std::sync::Arc;

use async_trait::async_trait;
use bcestack_auth::StaticCredentialProvider;
use bcestack_auth::canonical::uri_decode;
use bcestack_bos_model::headers::REQUEST_ID;
use bcestack_bos_model::types::Owner;
use bcestack_bos_model::{Body, BosError, Transport, TransportError};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::auth::{Requester, authenticate, authorize};
use crate::config::LocalBosConfig;
use crate::error::LocalServiceError;
use crate::ops::{empty_response, set_header};
use crate::router::{BosOperation, BosRequest, route};
use crate::state::BosServiceState;
use crate::utils::generate_request_id;

/// The in-memory, signature-verifying BOS service.
///
/// All fields are `Arc`-wrapped; clones share state.
///
/// # Examples
///
/// ```
/// use bcestack_bos_local::LocalBos;
/// use bcestack_bos_local::config::LocalBosConfig;
///
/// let service = LocalBos::new(LocalBosConfig::default()).with_credential("ak", "sk");
/// assert_eq!(service.config().region, "bj");
/// ```
#[derive(Debug, Clone)]
pub struct LocalBos {
    /// Buckets, objects and uploads.
    pub(crate) state: Arc<BosServiceState>,
    /// Provider configuration.
    pub(crate) config: Arc<LocalBosConfig>,
    /// Accepted key pairs.
    pub(crate) credentials: Arc<StaticCredentialProvider>,
    /// Offset added to the wall clock when checking validity windows.
    clock_offset: Arc<RwLock<TimeDelta>>,
}

impl LocalBos {
    /// Create a provider with empty state and the key pairs of `config`.
    #[must_use]
    pub fn new(config: LocalBosConfig) -> Self {
        let credentials = StaticCredentialProvider::new(
            config
                .credentials
                .iter()
                .map(|(ak, sk)| (ak.clone(), sk.clone())),
        );
        Self {
            state: Arc::new(BosServiceState::new()),
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            clock_offset: Arc::new(RwLock::new(TimeDelta::zero())),
        }
    }

    /// Accept one more key pair.
    #[must_use]
    pub fn with_credential(
        mut self,
        access_key_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.credentials).insert(access_key_id, secret_key);
        self
    }

    /// Returns a reference to the service state.
    #[must_use]
    pub fn state(&self) -> &BosServiceState {
        &self.state
    }

    /// Returns a reference to the provider configuration.
    #[must_use]
    pub fn config(&self) -> &LocalBosConfig {
        &self.config
    }

    /// Remove all buckets.
    pub fn reset(&self) {
        self.state.reset();
    }

    /// Move the service clock. Signatures are checked against the shifted
    /// time, which lets tests step past a validity window.
    pub fn advance_clock(&self, delta: TimeDelta) {
        *self.clock_offset.write() += delta;
    }

    /// The service's current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now() + *self.clock_offset.read()
    }

    /// The account owning every bucket.
    pub(crate) fn owner(&self) -> Owner {
        Owner {
            id: self.config.owner_id.clone(),
            display_name: self.config.owner_display_name.clone(),
        }
    }

    /// Decode, authenticate, route, authorize and handle one request.
    async fn dispatch(
        &self,
        request: http::Request<Body>,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        let request = BosRequest::from_http(request).await?;
        let requester = authenticate(&request, self.credentials.as_ref(), self.now())?;
        let operation = route(&request)?;
        authorize(&self.state, &requester, operation, request.bucket.as_deref())?;

        debug!(
            operation = %operation,
            path = %request.path,
            anonymous = requester.is_anonymous(),
            "dispatching request"
        );
        self.handle(operation, &request, &requester)
    }

    fn handle(
        &self,
        operation: BosOperation,
        request: &BosRequest,
        requester: &Requester,
    ) -> Result<http::Response<Body>, LocalServiceError> {
        match operation {
            BosOperation::ListBuckets => self.handle_list_buckets(),
            BosOperation::CreateBucket => self.handle_create_bucket(request),
            BosOperation::DeleteBucket => self.handle_delete_bucket(request),
            BosOperation::HeadBucket => self.handle_head_bucket(request),
            BosOperation::GetBucketLocation => self.handle_get_bucket_location(request),
            BosOperation::PutBucketAcl => self.handle_put_bucket_acl(request),
            BosOperation::GetBucketAcl => self.handle_get_bucket_acl(request),
            BosOperation::ListMultipartUploads => self.handle_list_multipart_uploads(request),
            BosOperation::PutObject => self.handle_put_object(request),
            BosOperation::CopyObject => self.handle_copy_object(request, requester),
            BosOperation::GetObject => self.handle_get_object(request),
            BosOperation::HeadObject => self.handle_head_object(request),
            BosOperation::DeleteObject => self.handle_delete_object(request),
            BosOperation::InitiateMultipartUpload => self.handle_initiate_multipart_upload(request),
            BosOperation::UploadPart => self.handle_upload_part(request),
            BosOperation::CompleteMultipartUpload => {
                self.handle_complete_multipart_upload(request)
            }
            BosOperation::AbortMultipartUpload => self.handle_abort_multipart_upload(request),
            BosOperation::ListParts => self.handle_list_parts(request),
        }
    }
}

#[async_trait]
impl Transport for LocalBos {
    async fn send(&self, request: http::Request<Body>) -> Result<http::Response<Body>, TransportError> {
        let request_id = generate_request_id();
        let is_head = request.method() == http::Method::HEAD;
        let resource = uri_decode(request.uri().path());

        let mut response = match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => error_response(err, &resource, &request_id, is_head),
        };
        set_header(&mut response, REQUEST_ID, &request_id);
        Ok(response)
    }
}

/// Render an error as a BOS JSON error response. HEAD responses carry only
/// the status.
fn error_response(
    err: LocalServiceError,
    resource: &str,
    request_id: &str,
    is_head: bool,
) -> http::Response<Body> {
    let err = BosError::from(err)
        .with_resource(resource)
        .with_request_id(request_id);
    if err.status_code.is_server_error() {
        warn!(code = %err.code, message = %err.message, resource, "request failed");
    } else {
        debug!(code = %err.code, message = %err.message, resource, "request rejected");
    }

    if is_head {
        return empty_response(err.status_code);
    }
    match serde_json::to_vec(&err.to_error_body()) {
        Ok(payload) => {
            let mut response = http::Response::new(Body::from(payload));
            *response.status_mut() = err.status_code;
            set_header(&mut response, http::header::CONTENT_TYPE.as_str(), "application/json");
            response
        }
        Err(_) => empty_response(err.status_code),
    }
}
