//! MD5 helpers for ETags and `Content-MD5`.

use base64::Engine;
use md5::{Digest, Md5};

use crate::error::{BosError, BosErrorCode};

/// Lower-case hex MD5 of `data`, the ETag of a single-part object.
///
/// # Examples
///
/// ```
/// use bcestack_bos_model::checksum::md5_hex;
///
/// assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Base64 MD5 of `data`, the value of a `Content-MD5` header.
///
/// # Examples
///
/// ```
/// use bcestack_bos_model::checksum::md5_base64;
///
/// assert_eq!(md5_base64(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
/// ```
#[must_use]
pub fn md5_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(Md5::digest(data))
}

/// Check a `Content-MD5` header against the received bytes. No header means
/// nothing to check.
///
/// # Errors
///
/// Returns `InvalidArgument` if the header is not valid base64 and
/// `BadDigest` if the digests differ.
pub fn validate_content_md5(content_md5: Option<&str>, body: &[u8]) -> Result<(), BosError> {
    let Some(expected_b64) = content_md5 else {
        return Ok(());
    };

    let expected_bytes = base64::engine::general_purpose::STANDARD
        .decode(expected_b64.trim())
        .map_err(|_| BosError::invalid_argument("Content-MD5 is not valid base64"))?;

    let actual = Md5::digest(body);
    if actual.as_slice() != expected_bytes {
        return Err(BosError::new(BosErrorCode::BadDigest));
    }

    Ok(())
}

/// ETag of a completed multipart object: the MD5 of the concatenated binary
/// part digests, followed by `-{part count}`.
///
/// Part ETags that are not valid hex contribute their raw bytes.
#[must_use]
pub fn multipart_etag<'a>(part_etags: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Md5::new();
    let mut count = 0usize;
    for etag in part_etags {
        match hex::decode(etag) {
            Ok(raw) => hasher.update(&raw),
            Err(_) => hasher.update(etag.as_bytes()),
        }
        count += 1;
    }
    format!("{}-{count}", hex::encode(hasher.finalize()))
}
