//! `bce-auth-v1` request signing.
//!
//! The token placed in the `Authorization` header is:
//!
//! ```text
//! bce-auth-v1/{accessKeyId}/{timestamp}/{expirationSeconds}/{signedHeaders}/{signature}
//! ```
//!
//! 1. `prefix`      = `bce-auth-v1/{accessKeyId}/{timestamp}/{expirationSeconds}`
//! 2. `signing key` = hex(HMAC-SHA256(secretKey, prefix))
//! 3. `signature`   = hex(HMAC-SHA256(signingKey, stringToSign))
//!
//! The hex form of the signing key is itself used as the HMAC key in step 3.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::canonical::{CanonicalRequest, RequestParts};
use crate::credentials::CredentialContext;
use crate::error::AuthError;

/// The auth version every token starts with.
pub const AUTH_VERSION: &str = "bce-auth-v1";

/// `strftime` pattern of signing timestamps (ISO 8601 basic form, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Validity window used when the caller does not choose one.
pub const DEFAULT_EXPIRATION_SECONDS: u32 = 1800;

type HmacSha256 = Hmac<Sha256>;

/// Per-call signing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    /// Seconds the signature stays valid after its timestamp.
    pub expiration_seconds: u32,
    /// Extra header names to sign besides `host`.
    pub headers_to_sign: Vec<String>,
    /// Fixed signing timestamp; the clock is read when `None`.
    pub timestamp: Option<String>,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            headers_to_sign: Vec::new(),
            timestamp: None,
        }
    }
}

impl SignOptions {
    /// Options with the given validity window and no extra headers.
    #[must_use]
    pub fn new(expiration_seconds: u32) -> Self {
        Self {
            expiration_seconds,
            ..Self::default()
        }
    }

    /// Sign these headers in addition to `host`.
    #[must_use]
    pub fn with_headers_to_sign<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers_to_sign = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Pin the signing timestamp instead of reading the clock.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// The output of one signing call.
///
/// `Display` renders the full authorization token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMaterial {
    /// Access key id that signed the request.
    pub access_key_id: String,
    /// Signing time, truncated to whole seconds.
    pub timestamp: DateTime<Utc>,
    /// Seconds the signature stays valid.
    pub expiration_seconds: u32,
    /// Lower-case signed header names in sorted order.
    pub signed_headers: Vec<String>,
    /// Lower-case hex signature.
    pub signature: String,
}

impl SignatureMaterial {
    /// `bce-auth-v1/{ak}/{timestamp}/{expiration}`.
    #[must_use]
    pub fn auth_string_prefix(&self) -> String {
        auth_string_prefix(
            &self.access_key_id,
            &format_timestamp(&self.timestamp),
            self.expiration_seconds,
        )
    }

    /// Render the full authorization token.
    #[must_use]
    pub fn to_token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SignatureMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.auth_string_prefix(),
            self.signed_headers.join(";"),
            self.signature
        )
    }
}

/// Sign a request and return the material for its authorization token.
///
/// The clock is read at most once per call; pass
/// [`SignOptions::timestamp`] to pin it.
///
/// # Errors
///
/// - [`AuthError::InvalidCredential`] if the credentials are incomplete
/// - [`AuthError::ClockSkew`] if a pinned timestamp cannot be parsed
/// - [`AuthError::MissingHeader`] if the request has no `host` header
///
/// # Examples
///
/// ```
/// use bcestack_auth::canonical::RequestParts;
/// use bcestack_auth::credentials::CredentialContext;
/// use bcestack_auth::signer::{SignOptions, sign};
///
/// let creds = CredentialContext::new("ak", "sk");
/// let headers = vec![("Host".to_owned(), "bj.bcebos.com".to_owned())];
/// let parts = RequestParts { method: "GET", path: "/bucket/key", query: &[], headers: &headers };
/// let options = SignOptions::new(1800).with_timestamp("20240101T000000Z");
///
/// let token = sign(&creds, &parts, &options).unwrap().to_token();
/// assert!(token.starts_with("bce-auth-v1/ak/20240101T000000Z/1800/host/"));
/// ```
pub fn sign(
    credentials: &CredentialContext,
    parts: &RequestParts<'_>,
    options: &SignOptions,
) -> Result<SignatureMaterial, AuthError> {
    credentials.validate()?;
    let timestamp = resolve_timestamp(options.timestamp.as_deref())?;
    let canonical = CanonicalRequest::new(parts, &options.headers_to_sign)?;
    Ok(sign_canonical(
        credentials,
        &canonical,
        timestamp,
        options.expiration_seconds,
    ))
}

/// Sign an already-built canonical request at a fixed time.
pub(crate) fn sign_canonical(
    credentials: &CredentialContext,
    canonical: &CanonicalRequest,
    timestamp: DateTime<Utc>,
    expiration_seconds: u32,
) -> SignatureMaterial {
    let prefix = auth_string_prefix(
        credentials.access_key_id(),
        &format_timestamp(&timestamp),
        expiration_seconds,
    );
    let string_to_sign = canonical.string_to_sign();
    debug!(prefix, string_to_sign, "Signing bce-auth-v1 request");

    let signing_key = derive_signing_key(credentials.secret_key(), &prefix);
    let signature = compute_signature(&signing_key, &string_to_sign);

    SignatureMaterial {
        access_key_id: credentials.access_key_id().to_owned(),
        timestamp,
        expiration_seconds,
        signed_headers: canonical.signed_header_names.clone(),
        signature,
    }
}

/// `bce-auth-v1/{ak}/{timestamp}/{expiration}`.
#[must_use]
pub fn auth_string_prefix(access_key_id: &str, timestamp: &str, expiration_seconds: u32) -> String {
    format!("{AUTH_VERSION}/{access_key_id}/{timestamp}/{expiration_seconds}")
}

/// Derive the hex signing key for one auth-string prefix.
///
/// # Examples
///
/// ```
/// use bcestack_auth::signer::derive_signing_key;
///
/// let key = derive_signing_key("sk", "bce-auth-v1/ak/20240101T000000Z/1800");
/// assert_eq!(key.len(), 64);
/// assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, auth_string_prefix: &str) -> String {
    hex::encode(hmac_sha256(
        secret_key.as_bytes(),
        auth_string_prefix.as_bytes(),
    ))
}

/// Compute the hex signature of `string_to_sign` under a hex signing key.
#[must_use]
pub fn compute_signature(signing_key: &str, string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(signing_key.as_bytes(), string_to_sign.as_bytes()))
}

/// Render a timestamp as `YYYYMMDDTHHMMSSZ`.
///
/// # Examples
///
/// ```
/// use bcestack_auth::signer::format_timestamp;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
/// assert_eq!(format_timestamp(&ts), "20240305T070809Z");
/// ```
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a signing timestamp.
///
/// Accepts the basic form `YYYYMMDDTHHMMSSZ` and RFC 3339
/// (`2024-03-05T07:08:09Z`). Sub-second precision is dropped.
///
/// # Errors
///
/// Returns [`AuthError::ClockSkew`] if the value is in neither form.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AuthError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(0))
        .map_err(|_| AuthError::ClockSkew(value.to_owned()))
}

/// The pinned timestamp, or the current time, at second precision.
pub(crate) fn resolve_timestamp(pinned: Option<&str>) -> Result<DateTime<Utc>, AuthError> {
    match pinned {
        Some(value) => parse_timestamp(value),
        None => Ok(Utc::now().trunc_subsecs(0)),
    }
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TIMESTAMP: &str = "20240101T000000Z";

    fn host_headers() -> Vec<(String, String)> {
        vec![("Host".to_owned(), "bj.bcebos.com".to_owned())]
    }

    #[test]
    fn test_should_produce_identical_tokens_for_identical_inputs() {
        let creds = CredentialContext::new("ak", "sk");
        let headers = host_headers();
        let parts = RequestParts {
            method: "PUT",
            path: "/bucket/key",
            query: &[],
            headers: &headers,
        };
        let options = SignOptions::new(300).with_timestamp(TEST_TIMESTAMP);

        let first = sign(&creds, &parts, &options).unwrap();
        let second = sign(&creds, &parts, &options).unwrap();
        assert_eq!(first.to_token(), second.to_token());
    }

    #[test]
    fn test_should_follow_two_step_hmac_derivation() {
        let creds = CredentialContext::new("ak", "sk");
        let headers = host_headers();
        let parts = RequestParts {
            method: "GET",
            path: "/bucket/key",
            query: &[],
            headers: &headers,
        };
        let material = sign(
            &creds,
            &parts,
            &SignOptions::new(1800).with_timestamp(TEST_TIMESTAMP),
        )
        .unwrap();

        let prefix = "bce-auth-v1/ak/20240101T000000Z/1800";
        let signing_key = derive_signing_key("sk", prefix);
        let expected = compute_signature(&signing_key, "GET\n/bucket/key\n\nhost:bj.bcebos.com");
        assert_eq!(material.signature, expected);
        assert_eq!(
            material.to_token(),
            format!("{prefix}/host/{expected}")
        );
    }

    #[test]
    fn test_should_change_signature_with_secret_key() {
        let headers = host_headers();
        let parts = RequestParts {
            method: "GET",
            path: "/",
            query: &[],
            headers: &headers,
        };
        let options = SignOptions::default().with_timestamp(TEST_TIMESTAMP);
        let a = sign(&CredentialContext::new("ak", "sk1"), &parts, &options).unwrap();
        let b = sign(&CredentialContext::new("ak", "sk2"), &parts, &options).unwrap();
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_should_reject_empty_credentials_before_signing() {
        let headers = host_headers();
        let parts = RequestParts {
            method: "GET",
            path: "/",
            query: &[],
            headers: &headers,
        };
        let result = sign(&CredentialContext::new("", "sk"), &parts, &SignOptions::default());
        assert!(matches!(result, Err(AuthError::InvalidCredential(_))));
    }

    #[test]
    fn test_should_report_clock_skew_for_unparseable_timestamp() {
        let headers = host_headers();
        let parts = RequestParts {
            method: "GET",
            path: "/",
            query: &[],
            headers: &headers,
        };
        let options = SignOptions::default().with_timestamp("yesterday");
        let result = sign(&CredentialContext::new("ak", "sk"), &parts, &options);
        assert_eq!(result, Err(AuthError::ClockSkew("yesterday".to_owned())));
    }

    #[test]
    fn test_should_parse_both_timestamp_forms() {
        let basic = parse_timestamp("20240305T070809Z").unwrap();
        let rfc = parse_timestamp("2024-03-05T07:08:09.750Z").unwrap();
        assert_eq!(basic, rfc);
        assert_eq!(format_timestamp(&basic), "20240305T070809Z");
    }

    #[test]
    fn test_should_render_signed_headers_joined_by_semicolon() {
        let creds = CredentialContext::new("ak", "sk");
        let headers = vec![
            ("host".to_owned(), "h".to_owned()),
            ("content-md5".to_owned(), "abc".to_owned()),
        ];
        let parts = RequestParts {
            method: "PUT",
            path: "/b/k",
            query: &[],
            headers: &headers,
        };
        let options = SignOptions::new(60)
            .with_headers_to_sign(["Content-MD5"])
            .with_timestamp(TEST_TIMESTAMP);
        let token = sign(&creds, &parts, &options).unwrap().to_token();
        let fields: Vec<&str> = token.split('/').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[4], "content-md5;host");
    }
}
