//! Shared utilities for the local service.
//!
//! ID generation, range-header parsing and copy-source parsing.

use bcestack_auth::canonical::uri_decode;
use uuid::Uuid;

use crate::error::LocalServiceError;

// ---------------------------------------------------------------------------
// ID generation
// ---------------------------------------------------------------------------

/// Generate a unique upload id (UUID v4 without dashes).
///
/// # Examples
///
/// ```
/// use bcestack_bos_local::utils::generate_upload_id;
///
/// let id = generate_upload_id();
/// assert_eq!(id.len(), 32);
/// assert_ne!(id, generate_upload_id());
/// ```
#[must_use]
pub fn generate_upload_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generate a unique request id (hyphenated UUID v4).
///
/// # Examples
///
/// ```
/// use bcestack_bos_local::utils::generate_request_id;
///
/// let id = generate_request_id();
/// assert_eq!(id.len(), 36);
/// ```
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

// ---------------------------------------------------------------------------
// Range parsing
// ---------------------------------------------------------------------------

/// Parse a `Range: bytes=...` header against an object length into an
/// inclusive `(start, end)` pair.
///
/// Supports `bytes=N-M`, `bytes=N-` and `bytes=-N`. The end is clamped to the
/// last byte.
///
/// # Errors
///
/// Returns [`LocalServiceError::InvalidRange`] for a malformed header, an
/// empty object, or a range starting past the end.
///
/// # Examples
///
/// ```
/// use bcestack_bos_local::utils::parse_range_header;
///
/// assert_eq!(parse_range_header("bytes=0-0", 4).unwrap(), (0, 0));
/// assert_eq!(parse_range_header("bytes=1-99", 4).unwrap(), (1, 3));
/// assert_eq!(parse_range_header("bytes=-2", 4).unwrap(), (2, 3));
/// assert!(parse_range_header("bytes=4-5", 4).is_err());
/// ```
pub fn parse_range_header(range: &str, content_length: u64) -> Result<(u64, u64), LocalServiceError> {
    let range = range
        .trim()
        .strip_prefix("bytes=")
        .ok_or(LocalServiceError::InvalidRange)?;

    if content_length == 0 {
        return Err(LocalServiceError::InvalidRange);
    }

    if let Some(suffix) = range.strip_prefix('-') {
        let n: u64 = suffix.parse().map_err(|_| LocalServiceError::InvalidRange)?;
        if n == 0 {
            return Err(LocalServiceError::InvalidRange);
        }
        Ok((content_length.saturating_sub(n), content_length - 1))
    } else if let Some(prefix) = range.strip_suffix('-') {
        let start: u64 = prefix.parse().map_err(|_| LocalServiceError::InvalidRange)?;
        if start >= content_length {
            return Err(LocalServiceError::InvalidRange);
        }
        Ok((start, content_length - 1))
    } else {
        let (start, end) = range
            .split_once('-')
            .ok_or(LocalServiceError::InvalidRange)?;
        let start: u64 = start.parse().map_err(|_| LocalServiceError::InvalidRange)?;
        let end: u64 = end.parse().map_err(|_| LocalServiceError::InvalidRange)?;
        if start > end || start >= content_length {
            return Err(LocalServiceError::InvalidRange);
        }
        Ok((start, end.min(content_length - 1)))
    }
}

// ---------------------------------------------------------------------------
// Copy source
// ---------------------------------------------------------------------------

/// Parse an `x-bce-copy-source` header (`/bucket/key`, percent-encoded) into
/// the decoded bucket and key.
///
/// # Errors
///
/// Returns [`LocalServiceError::InvalidArgument`] if the bucket or key is
/// missing.
///
/// # Examples
///
/// ```
/// use bcestack_bos_local::utils::parse_copy_source;
///
/// let (bucket, key) = parse_copy_source("/src/dir/a%20b.txt").unwrap();
/// assert_eq!(bucket, "src");
/// assert_eq!(key, "dir/a b.txt");
/// ```
pub fn parse_copy_source(source: &str) -> Result<(String, String), LocalServiceError> {
    let decoded = uri_decode(source.trim());
    let path = decoded.strip_prefix('/').unwrap_or(&decoded);

    let (bucket, key) = path
        .split_once('/')
        .ok_or_else(|| LocalServiceError::InvalidArgument {
            message: "Invalid copy source: must be in the format /bucket/key".to_owned(),
        })?;

    if bucket.is_empty() || key.is_empty() {
        return Err(LocalServiceError::InvalidArgument {
            message: "Invalid copy source: bucket and key must not be empty".to_owned(),
        });
    }

    Ok((bucket.to_owned(), key.to_owned()))
}
