//! Canonical request construction for `bce-auth-v1`.
//!
//! The string a request is signed over is:
//!
//! ```text
//! HTTPMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders
//! ```
//!
//! where canonical headers are `name:value` lines joined by `\n`. Every
//! component is built from raw (decoded) request values so that the client and
//! the verifying server arrive at the same bytes.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::AuthError;

/// Characters escaped by [`uri_encode`]: everything except `A-Z a-z 0-9 - _ . ~`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query parameter never included in the canonical query string.
const AUTHORIZATION_PARAM: &str = "authorization";

/// The header that is always signed.
pub const HOST_HEADER: &str = "host";

/// A borrowed view of the parts of a request that take part in signing.
///
/// `path` is the raw, unencoded resource path (`/bucket/my key`). `query` and
/// `headers` hold raw name/value pairs; header names may use any case.
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    /// HTTP method, e.g. `PUT`.
    pub method: &'a str,
    /// Raw resource path.
    pub path: &'a str,
    /// Raw query parameters in request order.
    pub query: &'a [(String, String)],
    /// Request headers in request order.
    pub headers: &'a [(String, String)],
}

/// The canonical form of a request, derived per call and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Percent-encoded path with `/` separators kept.
    pub canonical_uri: String,
    /// Sorted, percent-encoded `key=value` pairs joined by `&`.
    pub canonical_query_string: String,
    /// Sorted `name:value` lines joined by `\n`.
    pub canonical_headers: String,
    /// Lower-case signed header names in sorted order.
    pub signed_header_names: Vec<String>,
}

impl CanonicalRequest {
    /// Build the canonical request a client signs.
    ///
    /// `host` is always signed. Each name in `headers_to_sign` is signed when
    /// the request actually carries that header, and silently skipped
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHeader`] if the request has no `host` header.
    pub fn new(parts: &RequestParts<'_>, headers_to_sign: &[String]) -> Result<Self, AuthError> {
        let header_map = collect_headers(parts.headers);
        let signed = select_signed_headers(&header_map, headers_to_sign)?;
        Ok(Self::assemble(parts, &header_map, signed))
    }

    /// Build the canonical request over an exact list of signed headers, as
    /// the verifying side does with the names recorded in a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHeader`] if the list leaves out `host` or
    /// any listed header is absent.
    pub fn with_signed_headers(
        parts: &RequestParts<'_>,
        signed_headers: &[String],
    ) -> Result<Self, AuthError> {
        let header_map = collect_headers(parts.headers);
        let mut signed: Vec<String> = signed_headers
            .iter()
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        signed.sort_unstable();
        signed.dedup();
        if !signed.iter().any(|name| name == HOST_HEADER) {
            return Err(AuthError::MissingHeader(HOST_HEADER.to_owned()));
        }
        if let Some(missing) = signed.iter().find(|name| !header_map.contains_key(*name)) {
            return Err(AuthError::MissingHeader(missing.clone()));
        }
        Ok(Self::assemble(parts, &header_map, signed))
    }

    fn assemble(
        parts: &RequestParts<'_>,
        header_map: &BTreeMap<String, String>,
        signed_header_names: Vec<String>,
    ) -> Self {
        Self {
            method: parts.method.to_ascii_uppercase(),
            canonical_uri: build_canonical_uri(parts.path),
            canonical_query_string: build_canonical_query_string(parts.query),
            canonical_headers: build_canonical_headers(header_map, &signed_header_names),
            signed_header_names,
        }
    }

    /// The string that gets signed with the derived signing key.
    #[must_use]
    pub fn string_to_sign(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.method, self.canonical_uri, self.canonical_query_string, self.canonical_headers
        )
    }

    /// The signed header names joined by `;`, as rendered in the token.
    #[must_use]
    pub fn signed_headers_string(&self) -> String {
        self.signed_header_names.join(";")
    }
}

/// Percent-encode a string, escaping every byte outside `A-Z a-z 0-9 - _ . ~`.
///
/// # Examples
///
/// ```
/// use bcestack_auth::canonical::uri_encode;
///
/// assert_eq!(uri_encode("a b"), "a%20b");
/// assert_eq!(uri_encode("te%%st"), "te%25%25st");
/// assert_eq!(uri_encode("a/b"), "a%2Fb");
/// assert_eq!(uri_encode("safe-_.~"), "safe-_.~");
/// ```
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Percent-decode a string. Invalid UTF-8 is replaced lossily.
#[must_use]
pub fn uri_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

/// Build the canonical URI by encoding each raw path segment.
///
/// Forward slashes are kept. Empty paths become `/`, and a missing leading
/// slash is added.
///
/// # Examples
///
/// ```
/// use bcestack_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri(""), "/");
/// assert_eq!(build_canonical_uri("/bucket/my key"), "/bucket/my%20key");
/// assert_eq!(build_canonical_uri("bucket"), "/bucket");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    let encoded = path.split('/').map(uri_encode).collect::<Vec<_>>().join("/");
    if encoded.starts_with('/') {
        encoded
    } else {
        format!("/{encoded}")
    }
}

/// Build the canonical query string from raw parameter pairs.
///
/// The `authorization` parameter is dropped. Keys and values are
/// percent-encoded, pairs are sorted by encoded key with a stable sort so
/// repeated keys keep their relative order, and an empty value renders as
/// `key=`.
///
/// # Examples
///
/// ```
/// use bcestack_auth::canonical::build_canonical_query_string;
///
/// let query = vec![
///     ("uploadId".to_owned(), "abc".to_owned()),
///     ("partNumber".to_owned(), "1".to_owned()),
///     ("uploads".to_owned(), String::new()),
/// ];
/// assert_eq!(
///     build_canonical_query_string(&query),
///     "partNumber=1&uploadId=abc&uploads="
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .filter(|(key, _)| !key.eq_ignore_ascii_case(AUTHORIZATION_PARAM))
        .map(|(key, value)| (uri_encode(key), uri_encode(value)))
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Split a raw URI query string into decoded name/value pairs.
///
/// A parameter without `=` yields an empty value.
///
/// # Examples
///
/// ```
/// use bcestack_auth::canonical::parse_query_string;
///
/// let pairs = parse_query_string("uploads&prefix=a%20b");
/// assert_eq!(pairs[0], ("uploads".to_owned(), String::new()));
/// assert_eq!(pairs[1], ("prefix".to_owned(), "a b".to_owned()));
/// ```
#[must_use]
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            (uri_decode(key), uri_decode(value))
        })
        .collect()
}

/// Render raw pairs as an encoded query string, in the given order.
#[must_use]
pub fn encode_query_string(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                uri_encode(k)
            } else {
                format!("{}={}", uri_encode(k), uri_encode(v))
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Copy the headers of an `http` header map into owned pairs.
///
/// Values that are not visible ASCII are skipped.
#[must_use]
pub fn header_pairs(headers: &http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect()
}

/// Select the header names to sign: `host` plus every requested header the
/// request carries, lower-cased, de-duplicated and sorted.
fn select_signed_headers(
    header_map: &BTreeMap<String, String>,
    headers_to_sign: &[String],
) -> Result<Vec<String>, AuthError> {
    if !header_map.contains_key(HOST_HEADER) {
        return Err(AuthError::MissingHeader(HOST_HEADER.to_owned()));
    }

    let mut signed: Vec<String> = std::iter::once(HOST_HEADER.to_owned())
        .chain(
            headers_to_sign
                .iter()
                .map(|name| name.trim().to_ascii_lowercase()),
        )
        .filter(|name| header_map.contains_key(name))
        .collect();
    signed.sort_unstable();
    signed.dedup();
    Ok(signed)
}

/// Index request headers by lower-case name. Values are trimmed and repeated
/// headers are joined with `,`.
fn collect_headers(headers: &[(String, String)]) -> BTreeMap<String, String> {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let trimmed = value.trim();
        header_map
            .entry(name.trim().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(trimmed);
            })
            .or_insert_with(|| trimmed.to_owned());
    }
    header_map
}

fn build_canonical_headers(
    header_map: &BTreeMap<String, String>,
    signed_header_names: &[String],
) -> String {
    signed_header_names
        .iter()
        .filter_map(|name| header_map.get(name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}
