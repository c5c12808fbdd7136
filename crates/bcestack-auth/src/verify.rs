//! Server-side verification of `bce-auth-v1` authorization tokens.
//!
//! Verification parses the token, checks the validity window against a
//! caller-supplied clock, resolves the secret key, recomputes the canonical
//! request over exactly the headers named in the token, and compares
//! signatures in constant time.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{CanonicalRequest, RequestParts};
use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::signer::{
    AUTH_VERSION, auth_string_prefix, compute_signature, derive_signing_key, parse_timestamp,
};

/// The result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// The access key id that signed the request.
    pub access_key_id: String,
    /// The signing time.
    pub timestamp: DateTime<Utc>,
    /// The validity window in seconds.
    pub expiration_seconds: u32,
    /// The headers that were covered by the signature.
    pub signed_headers: Vec<String>,
}

/// Parsed fields of a `bce-auth-v1` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAuthorization {
    /// The access key id.
    pub access_key_id: String,
    /// The timestamp exactly as it appears in the token.
    pub timestamp: String,
    /// The validity window in seconds.
    pub expiration_seconds: u32,
    /// The signed header names.
    pub signed_headers: Vec<String>,
    /// The hex signature.
    pub signature: String,
}

/// Parse an authorization token.
///
/// # Errors
///
/// - [`AuthError::UnsupportedVersion`] if the token is not `bce-auth-v1`
/// - [`AuthError::InvalidAuthorization`] if a field is missing or malformed
///
/// # Examples
///
/// ```
/// use bcestack_auth::verify::parse_authorization;
///
/// let parsed = parse_authorization(
///     "bce-auth-v1/ak/20240101T000000Z/1800/host;x-bce-date/abcdef",
/// ).unwrap();
/// assert_eq!(parsed.access_key_id, "ak");
/// assert_eq!(parsed.expiration_seconds, 1800);
/// assert_eq!(parsed.signed_headers, vec!["host", "x-bce-date"]);
/// ```
pub fn parse_authorization(token: &str) -> Result<ParsedAuthorization, AuthError> {
    let fields: Vec<&str> = token.trim().split('/').collect();
    let [version, access_key_id, timestamp, expiration, signed_headers, signature] =
        fields.as_slice()
    else {
        return Err(AuthError::InvalidAuthorization(format!(
            "expected 6 '/'-separated fields, found {}",
            fields.len()
        )));
    };

    if *version != AUTH_VERSION {
        return Err(AuthError::UnsupportedVersion((*version).to_owned()));
    }
    if access_key_id.is_empty() || signature.is_empty() {
        return Err(AuthError::InvalidAuthorization(
            "empty access key id or signature".to_owned(),
        ));
    }

    let expiration_seconds = expiration.parse::<u32>().map_err(|_| {
        AuthError::InvalidAuthorization(format!("invalid expiration: {expiration}"))
    })?;

    Ok(ParsedAuthorization {
        access_key_id: (*access_key_id).to_owned(),
        timestamp: (*timestamp).to_owned(),
        expiration_seconds,
        signed_headers: signed_headers
            .split(';')
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        signature: (*signature).to_owned(),
    })
}

/// Accept iff `timestamp <= now <= timestamp + expiration_seconds`, compared
/// at second precision.
///
/// # Errors
///
/// Returns [`AuthError::RequestNotYetValid`] before the window and
/// [`AuthError::RequestExpired`] after it.
///
/// # Examples
///
/// ```
/// use bcestack_auth::verify::check_validity_window;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert!(check_validity_window(t0, 60, t0).is_ok());
/// assert!(check_validity_window(t0, 60, t0 + Duration::seconds(60)).is_ok());
/// assert!(check_validity_window(t0, 60, t0 + Duration::seconds(61)).is_err());
/// ```
pub fn check_validity_window(
    timestamp: DateTime<Utc>,
    expiration_seconds: u32,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let start = timestamp.timestamp();
    let end = start + i64::from(expiration_seconds);
    let now = now.timestamp();

    if now < start {
        return Err(AuthError::RequestNotYetValid);
    }
    if now > end {
        return Err(AuthError::RequestExpired);
    }
    Ok(())
}

/// Verify a request carrying its token in the `Authorization` header, using
/// the current time.
///
/// # Errors
///
/// See [`verify_at`].
pub fn verify(
    parts: &RequestParts<'_>,
    credential_provider: &dyn CredentialProvider,
) -> Result<AuthResult, AuthError> {
    verify_at(parts, credential_provider, Utc::now())
}

/// Verify a request carrying its token in the `Authorization` header at a
/// given instant.
///
/// # Errors
///
/// Returns an [`AuthError`] if:
/// - the `Authorization` header is missing or malformed
/// - the validity window does not contain `now`
/// - the access key is not found
/// - a signed header is missing
/// - the signature does not match
pub fn verify_at(
    parts: &RequestParts<'_>,
    credential_provider: &dyn CredentialProvider,
    now: DateTime<Utc>,
) -> Result<AuthResult, AuthError> {
    let token = parts
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.as_str())
        .ok_or(AuthError::MissingAuthorization)?;

    let parsed = parse_authorization(token)?;
    let timestamp = parse_timestamp(&parsed.timestamp)
        .map_err(|_| AuthError::InvalidAuthorization(format!("bad timestamp {}", parsed.timestamp)))?;

    debug!(
        access_key_id = %parsed.access_key_id,
        timestamp = %parsed.timestamp,
        expiration = parsed.expiration_seconds,
        "Verifying bce-auth-v1 signature"
    );

    check_validity_window(timestamp, parsed.expiration_seconds, now)?;

    let secret_key = credential_provider.get_secret_key(&parsed.access_key_id)?;
    let canonical = CanonicalRequest::with_signed_headers(parts, &parsed.signed_headers)?;

    let prefix = auth_string_prefix(
        &parsed.access_key_id,
        &parsed.timestamp,
        parsed.expiration_seconds,
    );
    check_signature(&secret_key, &prefix, &canonical, &parsed.signature)?;

    Ok(AuthResult {
        access_key_id: parsed.access_key_id,
        timestamp,
        expiration_seconds: parsed.expiration_seconds,
        signed_headers: canonical.signed_header_names,
    })
}

/// Recompute the signature for `canonical` and compare it in constant time.
pub(crate) fn check_signature(
    secret_key: &str,
    prefix: &str,
    canonical: &CanonicalRequest,
    provided: &str,
) -> Result<(), AuthError> {
    let string_to_sign = canonical.string_to_sign();
    debug!(string_to_sign, "Recomputed string to sign");

    let signing_key = derive_signing_key(secret_key, prefix);
    let expected = compute_signature(&signing_key, &string_to_sign);

    if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        debug!(expected = %expected, provided = %provided, "Signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::credentials::{CredentialContext, StaticCredentialProvider};
    use crate::signer::{SignOptions, sign};

    const TEST_ACCESS_KEY: &str = "ak";
    const TEST_SECRET_KEY: &str = "sk";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn test_credential_provider() -> StaticCredentialProvider {
        StaticCredentialProvider::new(vec![(
            TEST_ACCESS_KEY.to_owned(),
            TEST_SECRET_KEY.to_owned(),
        )])
    }

    fn signed_headers(expiration: u32) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Host".to_owned(), "localhost".to_owned()),
            ("x-bce-date".to_owned(), "20240101T000000Z".to_owned()),
        ];
        let parts = RequestParts {
            method: "GET",
            path: "/bucket/key",
            query: &[],
            headers: &headers,
        };
        let options = SignOptions::new(expiration)
            .with_headers_to_sign(["x-bce-date"])
            .with_timestamp("20240101T000000Z");
        let token = sign(
            &CredentialContext::new(TEST_ACCESS_KEY, TEST_SECRET_KEY),
            &parts,
            &options,
        )
        .unwrap()
        .to_token();
        headers.push(("Authorization".to_owned(), token));
        headers
    }

    #[test]
    fn test_should_accept_at_both_window_edges() {
        let headers = signed_headers(60);
        let parts = RequestParts {
            method: "GET",
            path: "/bucket/key",
            query: &[],
            headers: &headers,
        };
        let provider = test_credential_provider();

        let at_start = verify_at(&parts, &provider, t0()).unwrap();
        assert_eq!(at_start.access_key_id, TEST_ACCESS_KEY);
        assert_eq!(at_start.signed_headers, vec!["host", "x-bce-date"]);
        assert!(verify_at(&parts, &provider, t0() + Duration::seconds(60)).is_ok());
    }

    #[test]
    fn test_should_reject_outside_window() {
        let headers = signed_headers(60);
        let parts = RequestParts {
            method: "GET",
            path: "/bucket/key",
            query: &[],
            headers: &headers,
        };
        let provider = test_credential_provider();

        assert_eq!(
            verify_at(&parts, &provider, t0() + Duration::seconds(61)),
            Err(AuthError::RequestExpired)
        );
        assert_eq!(
            verify_at(&parts, &provider, t0() - Duration::seconds(1)),
            Err(AuthError::RequestNotYetValid)
        );
    }

    #[test]
    fn test_should_compare_window_at_second_precision() {
        let now = t0() + Duration::seconds(60) + Duration::milliseconds(999);
        assert!(check_validity_window(t0(), 60, now).is_ok());
    }

    #[test]
    fn test_should_reject_tampered_path() {
        let headers = signed_headers(60);
        let parts = RequestParts {
            method: "GET",
            path: "/bucket/other",
            query: &[],
            headers: &headers,
        };
        let result = verify_at(&parts, &test_credential_provider(), t0());
        assert_eq!(result, Err(AuthError::SignatureDoesNotMatch));
    }

    #[test]
    fn test_should_reject_wrong_secret_key() {
        let headers = signed_headers(60);
        let parts = RequestParts {
            method: "GET",
            path: "/bucket/key",
            query: &[],
            headers: &headers,
        };
        let provider =
            StaticCredentialProvider::new(vec![(TEST_ACCESS_KEY.to_owned(), "other".to_owned())]);
        let result = verify_at(&parts, &provider, t0());
        assert_eq!(result, Err(AuthError::SignatureDoesNotMatch));
    }

    #[test]
    fn test_should_reject_missing_signed_header() {
        let headers: Vec<(String, String)> = signed_headers(60)
            .into_iter()
            .filter(|(name, _)| name != "x-bce-date")
            .collect();
        let parts = RequestParts {
            method: "GET",
            path: "/bucket/key",
            query: &[],
            headers: &headers,
        };
        let result = verify_at(&parts, &test_credential_provider(), t0());
        assert_eq!(result, Err(AuthError::MissingHeader("x-bce-date".to_owned())));
    }

    #[test]
    fn test_should_reject_token_that_does_not_sign_host() {
        for token in [
            "bce-auth-v1/ak/20240101T000000Z/60//0123abcd",
            "bce-auth-v1/ak/20240101T000000Z/60/x-bce-date/0123abcd",
        ] {
            let headers = vec![
                ("host".to_owned(), "localhost".to_owned()),
                ("x-bce-date".to_owned(), "20240101T000000Z".to_owned()),
                ("authorization".to_owned(), token.to_owned()),
            ];
            let parts = RequestParts {
                method: "GET",
                path: "/bucket/key",
                query: &[],
                headers: &headers,
            };
            let result = verify_at(&parts, &test_credential_provider(), t0());
            assert_eq!(result, Err(AuthError::MissingHeader("host".to_owned())), "{token}");
        }
    }

    #[test]
    fn test_should_require_authorization_header() {
        let headers = vec![("host".to_owned(), "localhost".to_owned())];
        let parts = RequestParts {
            method: "GET",
            path: "/",
            query: &[],
            headers: &headers,
        };
        let result = verify_at(&parts, &test_credential_provider(), t0());
        assert_eq!(result, Err(AuthError::MissingAuthorization));
    }

    #[test]
    fn test_should_reject_unknown_auth_version() {
        let result = parse_authorization("bce-auth-v2/ak/20240101T000000Z/60/host/abc");
        assert_eq!(
            result,
            Err(AuthError::UnsupportedVersion("bce-auth-v2".to_owned()))
        );
    }

    #[test]
    fn test_should_reject_truncated_token() {
        let result = parse_authorization("bce-auth-v1/ak/20240101T000000Z/60");
        assert!(matches!(result, Err(AuthError::InvalidAuthorization(_))));
    }
}
