//! Operation handlers.
//!
//! Each submodule exposes `handle_*` methods on [`crate::provider::LocalBos`].
//! Handlers receive a routed, authorized [`crate::router::BosRequest`] and
//! build the wire response; errors are rendered by the provider.

mod bucket;
mod multipart;
mod object;

use bcestack_bos_model::headers::{
    USER_METADATA_PREFIX, format_http_date, header_str, quote_etag, user_metadata_from_headers,
};
use bcestack_bos_model::{Body, ObjectMetadata};
use http::header::{HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::LocalServiceError;
use crate::router::BosRequest;
use crate::state::StoredObject;

/// A `200 OK` response with a JSON body.
pub(crate) fn json_response<T: Serialize>(value: &T) -> Result<http::Response<Body>, LocalServiceError> {
    let payload = serde_json::to_vec(value)
        .map_err(|e| anyhow::anyhow!("failed to encode response body: {e}"))?;
    let mut response = http::Response::new(Body::from(payload));
    set_header(&mut response, http::header::CONTENT_TYPE.as_str(), "application/json");
    Ok(response)
}

/// A bodiless response.
pub(crate) fn empty_response(status: http::StatusCode) -> http::Response<Body> {
    let mut response = http::Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Set a header, skipping names or values that are not valid in HTTP.
pub(crate) fn set_header(response: &mut http::Response<Body>, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        response.headers_mut().insert(name, value);
    }
}

/// The content type and user metadata a write request carries.
///
/// `Content-Length` and `Content-MD5` describe the request body, not the
/// object, and are left out.
pub(crate) fn metadata_from_request(request: &BosRequest) -> ObjectMetadata {
    ObjectMetadata {
        content_type: header_str(&request.headers, http::header::CONTENT_TYPE.as_str())
            .map(ToOwned::to_owned),
        user_metadata: user_metadata_from_headers(&request.headers),
        ..ObjectMetadata::default()
    }
}

/// Write the headers describing `object`, except `Content-Length`.
pub(crate) fn set_object_headers(response: &mut http::Response<Body>, object: &StoredObject) {
    if let Some(content_type) = &object.metadata.content_type {
        set_header(response, http::header::CONTENT_TYPE.as_str(), content_type);
    }
    set_header(response, http::header::ETAG.as_str(), &quote_etag(object.e_tag()));
    set_header(
        response,
        http::header::LAST_MODIFIED.as_str(),
        &format_http_date(&object.last_modified()),
    );
    for (key, value) in &object.metadata.user_metadata {
        set_header(response, &format!("{USER_METADATA_PREFIX}{key}"), value);
    }
}

/// Parse an optional numeric query parameter.
pub(crate) fn query_number<T: std::str::FromStr>(
    request: &BosRequest,
    name: &str,
) -> Result<Option<T>, LocalServiceError> {
    request
        .query_value(name)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse().map_err(|_| LocalServiceError::InvalidArgument {
                message: format!("{name} must be a non-negative integer, got {v}"),
            })
        })
        .transpose()
}
