//! The BOS client facade.
//!
//! [`BosClient`] turns per-operation request structs into signed
//! `http::Request<Body>` values, hands them to a [`Transport`] and decodes
//! the responses. Operations live in the [`crate::ops`] submodules as
//! `impl BosClient` blocks; this module owns the shared plumbing: path and
//! query assembly, signing, and error decoding.

use std::sync::Arc;

use bcestack_auth::CredentialContext;
use bcestack_auth::canonical::{HOST_HEADER, RequestParts, build_canonical_uri, encode_query_string};
use bcestack_auth::signer::{SignOptions, format_timestamp, sign};
use bcestack_bos_model::headers::{DATE, REQUEST_ID, SECURITY_TOKEN, header_str};
use bcestack_bos_model::{Body, BosError, BosErrorCode, BosResult, ErrorBody, Transport};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::BosClientConfig;

/// Headers signed on every request when present, beyond `host` and `x-bce-*`.
const SIGNED_CONTENT_HEADERS: [&str; 3] = ["content-type", "content-md5", "content-length"];

/// Client for a BOS endpoint.
///
/// Cheap to clone; clones share the transport.
///
/// # Examples
///
/// ```no_run
/// # async fn example(transport: std::sync::Arc<dyn bcestack_bos_model::Transport>) {
/// use bcestack_bos_core::{BosClient, BosClientConfig};
///
/// let config = BosClientConfig::builder()
///     .access_key_id("ak".into())
///     .secret_access_key("sk".into())
///     .build();
/// let client = BosClient::new(config, transport);
/// let data = client.get_object_content("bucket", "key").await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BosClient {
    config: Arc<BosClientConfig>,
    credentials: Option<CredentialContext>,
    transport: Arc<dyn Transport>,
}

/// A logical request before signing.
#[derive(Debug, Default)]
pub(crate) struct OperationRequest {
    pub(crate) method: http::Method,
    pub(crate) bucket: Option<String>,
    pub(crate) key: Option<String>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Body,
}

impl OperationRequest {
    pub(crate) fn new(method: http::Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub(crate) fn bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_owned());
        self
    }

    pub(crate) fn object(mut self, bucket: &str, key: &str) -> Self {
        self.bucket = Some(bucket.to_owned());
        self.key = Some(key.to_owned());
        self
    }

    pub(crate) fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_owned(), value.into()));
        self
    }

    pub(crate) fn query_opt(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(name, v.to_string()),
            None => self,
        }
    }

    pub(crate) fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub(crate) fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub(crate) fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// The raw resource path: `/`, `/bucket` or `/bucket/key`.
    pub(crate) fn path(&self) -> String {
        match (&self.bucket, &self.key) {
            (Some(bucket), Some(key)) => format!("/{bucket}/{key}"),
            (Some(bucket), None) => format!("/{bucket}"),
            _ => "/".to_owned(),
        }
    }

    fn resource(&self) -> Option<String> {
        self.bucket.as_ref().map(|_| self.path())
    }
}

impl BosClient {
    /// Create a client over a transport.
    #[must_use]
    pub fn new(config: BosClientConfig, transport: Arc<dyn Transport>) -> Self {
        let credentials = config.credentials();
        Self {
            config: Arc::new(config),
            credentials,
            transport,
        }
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &BosClientConfig {
        &self.config
    }

    /// The signing credentials, if any.
    #[must_use]
    pub fn credentials(&self) -> Option<&CredentialContext> {
        self.credentials.as_ref()
    }

    /// Whether requests go out unsigned.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }

    /// The transport requests are sent through.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Sign and send a request; non-2xx responses become errors.
    pub(crate) async fn execute(&self, request: OperationRequest) -> BosResult<http::Response<Body>> {
        let resource = request.resource();
        let http_request = self.build_request(request)?;
        debug!(
            method = %http_request.method(),
            uri = %http_request.uri(),
            "Sending BOS request"
        );
        let response = self.transport.send(http_request).await?;
        check_response(response, resource).await
    }

    /// Sign and send a request, then decode a JSON response body.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        request: OperationRequest,
    ) -> BosResult<T> {
        let response = self.execute(request).await?;
        read_json(response).await
    }

    /// Assemble the signed `http::Request` for a logical request.
    pub(crate) fn build_request(&self, request: OperationRequest) -> BosResult<http::Request<Body>> {
        let path = request.path();
        let OperationRequest {
            method,
            query,
            mut headers,
            body,
            ..
        } = request;

        headers.insert(0, (HOST_HEADER.to_owned(), self.config.host().to_owned()));
        if !headers
            .iter()
            .any(|(name, _)| name == http::header::CONTENT_LENGTH.as_str())
        {
            if let Some(length) = body.size_hint() {
                headers.push((http::header::CONTENT_LENGTH.as_str().to_owned(), length.to_string()));
            }
        }

        if let Some(credentials) = &self.credentials {
            let now = Utc::now();
            let timestamp = format_timestamp(&now);
            headers.push((DATE.to_owned(), timestamp.clone()));
            if let Some(token) = credentials.session_token() {
                headers.push((SECURITY_TOKEN.to_owned(), token.to_owned()));
            }

            let headers_to_sign: Vec<String> = headers
                .iter()
                .map(|(name, _)| name.to_ascii_lowercase())
                .filter(|name| name.starts_with("x-bce-") || SIGNED_CONTENT_HEADERS.contains(&name.as_str()))
                .collect();
            let options = SignOptions::new(self.config.request_expiration_seconds)
                .with_headers_to_sign(headers_to_sign)
                .with_timestamp(timestamp);
            let parts = RequestParts {
                method: method.as_str(),
                path: &path,
                query: &query,
                headers: &headers,
            };
            let material = sign(credentials, &parts, &options)?;
            headers.push((http::header::AUTHORIZATION.as_str().to_owned(), material.to_token()));
        }

        let mut uri = format!(
            "{}{}",
            self.config.endpoint.trim_end_matches('/'),
            build_canonical_uri(&path)
        );
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&encode_query_string(&query));
        }

        let mut builder = http::Request::builder().method(method).uri(uri);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(body)
            .map_err(|e| BosError::invalid_argument(format!("Invalid request: {e}")).with_source(e))
    }
}

/// Pass 2xx responses through; decode everything else into a [`BosError`].
///
/// Error bodies are `{"code","message","requestId"}`. Responses without a
/// decodable body (e.g. to `HEAD`) are classified by status.
pub(crate) async fn check_response(
    response: http::Response<Body>,
    resource: Option<String>,
) -> BosResult<http::Response<Body>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let request_id = header_str(response.headers(), REQUEST_ID).map(ToOwned::to_owned);
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| BosError::with_message(BosErrorCode::TransportFailure, e.to_string()).with_source(e))?;

    let mut error = match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(error_body) => BosError::from_error_body(status, error_body),
        Err(_) => BosError::new(code_for_status(status, resource.as_deref())).with_status(status),
    };
    if error.request_id.is_none() {
        error.request_id = request_id;
    }
    if let Some(resource) = resource {
        error = error.with_resource(resource);
    }
    warn!(code = %error.code, status = %status, message = %error.message, "BOS request failed");
    Err(error)
}

/// Decode a JSON response body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: http::Response<Body>) -> BosResult<T> {
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| BosError::with_message(BosErrorCode::TransportFailure, e.to_string()).with_source(e))?;
    serde_json::from_slice(&body).map_err(|e| {
        BosError::internal(format!("Failed to decode response body: {e}")).with_source(e)
    })
}

fn code_for_status(status: http::StatusCode, resource: Option<&str>) -> BosErrorCode {
    match status {
        http::StatusCode::NOT_FOUND => {
            // `/bucket` vs `/bucket/key`.
            if resource.is_some_and(|r| r.trim_start_matches('/').contains('/')) {
                BosErrorCode::NoSuchKey
            } else {
                BosErrorCode::NoSuchBucket
            }
        }
        http::StatusCode::FORBIDDEN => BosErrorCode::AccessDenied,
        http::StatusCode::UNAUTHORIZED => BosErrorCode::AuthenticationFailed,
        http::StatusCode::RANGE_NOT_SATISFIABLE => BosErrorCode::InvalidRange,
        http::StatusCode::METHOD_NOT_ALLOWED => BosErrorCode::MethodNotAllowed,
        _ => BosErrorCode::Custom(status.as_str().to_owned()),
    }
}
