//! BOS header names and the mapping between [`ObjectMetadata`] and headers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use http::HeaderMap;

use crate::types::ObjectMetadata;

/// Prefix of user metadata headers.
pub const USER_METADATA_PREFIX: &str = "x-bce-meta-";
/// Canned ACL header.
pub const ACL: &str = "x-bce-acl";
/// Copy source (`/bucket/key`) header.
pub const COPY_SOURCE: &str = "x-bce-copy-source";
/// Metadata directive for copies.
pub const METADATA_DIRECTIVE: &str = "x-bce-metadata-directive";
/// Session token header for temporary credentials.
pub const SECURITY_TOKEN: &str = "x-bce-security-token";
/// Request id assigned by the service.
pub const REQUEST_ID: &str = "x-bce-request-id";
/// Signing timestamp header.
pub const DATE: &str = "x-bce-date";
/// Base64 MD5 of the request body.
pub const CONTENT_MD5: &str = "content-md5";

/// Strip the quotes the wire form of an ETag carries.
///
/// # Examples
///
/// ```
/// use bcestack_bos_model::headers::unquote_etag;
///
/// assert_eq!(unquote_etag("\"abc\""), "abc");
/// assert_eq!(unquote_etag("abc"), "abc");
/// ```
#[must_use]
pub fn unquote_etag(etag: &str) -> &str {
    etag.trim().trim_matches('"')
}

/// Quote an ETag for the `ETag` header.
#[must_use]
pub fn quote_etag(etag: &str) -> String {
    format!("\"{}\"", unquote_etag(etag))
}

/// Render the content headers and user metadata headers of `metadata` as
/// name/value pairs. `ETag` and `Last-Modified` are server-owned and skipped.
#[must_use]
pub fn metadata_to_headers(metadata: &ObjectMetadata) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    if let Some(content_type) = &metadata.content_type {
        headers.push((http::header::CONTENT_TYPE.as_str().to_owned(), content_type.clone()));
    }
    if let Some(content_md5) = &metadata.content_md5 {
        headers.push((CONTENT_MD5.to_owned(), content_md5.clone()));
    }
    for (key, value) in &metadata.user_metadata {
        headers.push((
            format!("{USER_METADATA_PREFIX}{}", key.to_ascii_lowercase()),
            value.clone(),
        ));
    }
    headers
}

/// Collect the `x-bce-meta-*` headers into a map keyed without the prefix.
#[must_use]
pub fn user_metadata_from_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(USER_METADATA_PREFIX)?;
            let value = value.to_str().ok()?;
            Some((key.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Read object metadata from response headers.
#[must_use]
pub fn metadata_from_headers(headers: &HeaderMap) -> ObjectMetadata {
    ObjectMetadata {
        content_type: header_str(headers, http::header::CONTENT_TYPE.as_str()).map(ToOwned::to_owned),
        content_length: header_str(headers, http::header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse().ok()),
        content_md5: header_str(headers, CONTENT_MD5).map(ToOwned::to_owned),
        user_metadata: user_metadata_from_headers(headers),
        e_tag: header_str(headers, http::header::ETAG.as_str())
            .map(|v| unquote_etag(v).to_owned()),
        last_modified: header_str(headers, http::header::LAST_MODIFIED.as_str())
            .and_then(parse_http_date),
    }
}

/// Read a header as a string, if present and visible ASCII.
#[must_use]
pub fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Render a time as an HTTP date (`Tue, 15 Nov 1994 08:12:31 GMT`).
#[must_use]
pub fn format_http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP date as written by [`format_http_date`].
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
