//! Presigned URLs for `bce-auth-v1`.
//!
//! A presigned URL carries its authorization material in query parameters
//! instead of the `Authorization` header:
//!
//! - `x-bce-access-key-id` - the signing access key id
//! - `x-bce-date` - signing timestamp (`YYYYMMDDTHHMMSSZ`)
//! - `x-bce-expires` - validity window in seconds
//! - `x-bce-signed-headers` - `;`-separated signed header names
//! - `x-bce-security-token` - session token, only for temporary credentials
//! - `x-bce-signature` - the hex signature
//!
//! Every parameter except `x-bce-signature` is part of the canonical query
//! string that gets signed.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::canonical::{
    CanonicalRequest, RequestParts, build_canonical_uri, encode_query_string,
};
use crate::credentials::{CredentialContext, CredentialProvider};
use crate::error::AuthError;
use crate::signer::{
    SignOptions, SignatureMaterial, auth_string_prefix, format_timestamp, parse_timestamp,
    resolve_timestamp, sign_canonical,
};
use crate::verify::{AuthResult, check_signature, check_validity_window};

/// Query parameter holding the access key id.
pub const PARAM_ACCESS_KEY_ID: &str = "x-bce-access-key-id";
/// Query parameter holding the signing timestamp.
pub const PARAM_DATE: &str = "x-bce-date";
/// Query parameter holding the validity window.
pub const PARAM_EXPIRES: &str = "x-bce-expires";
/// Query parameter holding the signed header names.
pub const PARAM_SIGNED_HEADERS: &str = "x-bce-signed-headers";
/// Query parameter holding the signature.
pub const PARAM_SIGNATURE: &str = "x-bce-signature";
/// Query parameter holding the session token.
pub const PARAM_SECURITY_TOKEN: &str = "x-bce-security-token";

/// Longest validity window a presigned URL may request: 7 days.
pub const MAX_PRESIGN_EXPIRATION_SECONDS: u32 = 7 * 24 * 60 * 60;

/// A generated presigned URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The fully qualified URL.
    pub url: String,
    /// The raw query parameters carried by the URL, signature last.
    pub query: Vec<(String, String)>,
    /// The signature material the URL encodes.
    pub material: SignatureMaterial,
}

/// Builds presigned URLs against one endpoint with one set of credentials.
///
/// # Examples
///
/// ```
/// use bcestack_auth::canonical::RequestParts;
/// use bcestack_auth::credentials::CredentialContext;
/// use bcestack_auth::presigned::PresignedUrlBuilder;
/// use bcestack_auth::signer::SignOptions;
///
/// let creds = CredentialContext::new("ak", "sk");
/// let headers = vec![("host".to_owned(), "bj.bcebos.com".to_owned())];
/// let parts = RequestParts { method: "GET", path: "/bucket/a b", query: &[], headers: &headers };
///
/// let presigned = PresignedUrlBuilder::new(&creds, "http://bj.bcebos.com")
///     .presign(&parts, &SignOptions::new(3600))
///     .unwrap();
/// assert!(presigned.url.starts_with("http://bj.bcebos.com/bucket/a%20b?"));
/// assert!(presigned.url.contains("x-bce-expires=3600"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PresignedUrlBuilder<'a> {
    credentials: &'a CredentialContext,
    endpoint: &'a str,
}

impl<'a> PresignedUrlBuilder<'a> {
    /// Create a builder for `endpoint` (scheme and authority, e.g.
    /// `http://bj.bcebos.com`).
    #[must_use]
    pub fn new(credentials: &'a CredentialContext, endpoint: &'a str) -> Self {
        Self {
            credentials,
            endpoint,
        }
    }

    /// Presign a request.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidExpiration`] for a zero-second window
    /// - [`AuthError::ExpirationTooLarge`] for more than
    ///   [`MAX_PRESIGN_EXPIRATION_SECONDS`]
    /// - any error [`crate::signer::sign`] reports
    pub fn presign(
        &self,
        parts: &RequestParts<'_>,
        options: &SignOptions,
    ) -> Result<PresignedUrl, AuthError> {
        validate_expiration(options.expiration_seconds)?;
        self.credentials.validate()?;
        let timestamp = resolve_timestamp(options.timestamp.as_deref())?;

        // Signed header names must be known before the query is built, so
        // resolve them against the request first.
        let resolved = CanonicalRequest::new(parts, &options.headers_to_sign)?;

        let mut query: Vec<(String, String)> = parts.query.to_vec();
        query.push((
            PARAM_ACCESS_KEY_ID.to_owned(),
            self.credentials.access_key_id().to_owned(),
        ));
        query.push((PARAM_DATE.to_owned(), format_timestamp(&timestamp)));
        query.push((
            PARAM_EXPIRES.to_owned(),
            options.expiration_seconds.to_string(),
        ));
        query.push((
            PARAM_SIGNED_HEADERS.to_owned(),
            resolved.signed_headers_string(),
        ));
        if let Some(token) = self.credentials.session_token() {
            query.push((PARAM_SECURITY_TOKEN.to_owned(), token.to_owned()));
        }

        let signing_parts = RequestParts {
            query: &query,
            ..*parts
        };
        let canonical = CanonicalRequest::with_signed_headers(&signing_parts, &resolved.signed_header_names)?;
        let material = sign_canonical(
            self.credentials,
            &canonical,
            timestamp,
            options.expiration_seconds,
        );
        query.push((PARAM_SIGNATURE.to_owned(), material.signature.clone()));

        let url = format!(
            "{}{}?{}",
            self.endpoint.trim_end_matches('/'),
            build_canonical_uri(parts.path),
            encode_query_string(&query)
        );
        debug!(url, expiration = options.expiration_seconds, "Generated presigned URL");

        Ok(PresignedUrl {
            url,
            query,
            material,
        })
    }
}

/// Presign a request and return only the URL.
///
/// # Errors
///
/// See [`PresignedUrlBuilder::presign`].
pub fn build_presigned_url(
    credentials: &CredentialContext,
    endpoint: &str,
    parts: &RequestParts<'_>,
    options: &SignOptions,
) -> Result<String, AuthError> {
    PresignedUrlBuilder::new(credentials, endpoint)
        .presign(parts, options)
        .map(|presigned| presigned.url)
}

/// Check a requested presign window.
///
/// # Errors
///
/// Returns [`AuthError::InvalidExpiration`] for zero and
/// [`AuthError::ExpirationTooLarge`] above the 7-day maximum.
pub fn validate_expiration(expiration_seconds: u32) -> Result<(), AuthError> {
    if expiration_seconds == 0 {
        return Err(AuthError::InvalidExpiration);
    }
    if expiration_seconds > MAX_PRESIGN_EXPIRATION_SECONDS {
        return Err(AuthError::ExpirationTooLarge {
            requested: expiration_seconds,
            max: MAX_PRESIGN_EXPIRATION_SECONDS,
        });
    }
    Ok(())
}

/// Whether a request authorizes itself through presigned query parameters.
#[must_use]
pub fn is_presigned(query: &[(String, String)]) -> bool {
    query.iter().any(|(key, _)| key == PARAM_SIGNATURE)
}

/// Verify a presigned request at the current time.
///
/// # Errors
///
/// See [`verify_presigned_at`].
pub fn verify_presigned(
    parts: &RequestParts<'_>,
    credential_provider: &dyn CredentialProvider,
) -> Result<AuthResult, AuthError> {
    verify_presigned_at(parts, credential_provider, Utc::now())
}

/// Verify a presigned request at a given instant.
///
/// `parts.query` holds the decoded query parameters of the URL.
///
/// # Errors
///
/// Returns an [`AuthError`] if:
/// - a required query parameter is missing or malformed
/// - the validity window does not contain `now`
/// - the access key is not found
/// - a signed header is missing
/// - the signature does not match
pub fn verify_presigned_at(
    parts: &RequestParts<'_>,
    credential_provider: &dyn CredentialProvider,
    now: DateTime<Utc>,
) -> Result<AuthResult, AuthError> {
    let access_key_id = required_param(parts.query, PARAM_ACCESS_KEY_ID)?;
    let date = required_param(parts.query, PARAM_DATE)?;
    let expires = required_param(parts.query, PARAM_EXPIRES)?;
    let signed_headers = required_param(parts.query, PARAM_SIGNED_HEADERS)?;
    let signature = required_param(parts.query, PARAM_SIGNATURE)?;

    let expiration_seconds: u32 = expires
        .parse()
        .map_err(|_| AuthError::MissingQueryParam(format!("{PARAM_EXPIRES} (invalid integer)")))?;
    let timestamp = parse_timestamp(date)
        .map_err(|_| AuthError::MissingQueryParam(format!("{PARAM_DATE} (invalid format)")))?;

    debug!(
        access_key_id,
        date,
        expiration = expiration_seconds,
        "Verifying presigned URL"
    );

    check_validity_window(timestamp, expiration_seconds, now)?;

    let secret_key = credential_provider.get_secret_key(access_key_id)?;

    let signed_header_names: Vec<String> = signed_headers
        .split(';')
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    let query_without_signature: Vec<(String, String)> = parts
        .query
        .iter()
        .filter(|(key, _)| key != PARAM_SIGNATURE)
        .cloned()
        .collect();
    let signing_parts = RequestParts {
        query: &query_without_signature,
        ..*parts
    };
    let canonical = CanonicalRequest::with_signed_headers(&signing_parts, &signed_header_names)?;

    let prefix = auth_string_prefix(access_key_id, date, expiration_seconds);
    check_signature(&secret_key, &prefix, &canonical, signature)?;

    Ok(AuthResult {
        access_key_id: access_key_id.to_owned(),
        timestamp,
        expiration_seconds,
        signed_headers: canonical.signed_header_names,
    })
}

fn required_param<'q>(query: &'q [(String, String)], name: &str) -> Result<&'q str, AuthError> {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| AuthError::MissingQueryParam(name.to_owned()))
}
