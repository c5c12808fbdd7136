//! Error types for `bce-auth-v1` signing and verification.
//!
//! Signing-side failures ([`AuthError::InvalidCredential`],
//! [`AuthError::ClockSkew`], [`AuthError::InvalidExpiration`],
//! [`AuthError::ExpirationTooLarge`]) are detected before any network call.
//! The remaining variants are produced by the verifying side.

/// Errors that can occur while signing or verifying a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The access key id or secret key is empty or malformed.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// A caller-supplied signing timestamp could not be parsed.
    #[error("Unparseable signing timestamp: {0}")]
    ClockSkew(String),

    /// A presign expiration of zero seconds was requested.
    #[error("Expiration must be greater than zero seconds")]
    InvalidExpiration,

    /// A presign expiration exceeds the allowed maximum.
    #[error("Expiration of {requested}s exceeds the maximum of {max}s")]
    ExpirationTooLarge {
        /// The requested expiration in seconds.
        requested: u32,
        /// The policy maximum in seconds.
        max: u32,
    },

    /// The request carries no authorization material.
    #[error("Missing Authorization header")]
    MissingAuthorization,

    /// The authorization token could not be parsed.
    #[error("Invalid authorization format: {0}")]
    InvalidAuthorization(String),

    /// The authorization token uses an unknown auth version.
    #[error("Unsupported auth version: {0}")]
    UnsupportedVersion(String),

    /// A header listed as signed is absent from the request.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// A required presigned-URL query parameter is absent or malformed.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),

    /// The access key id was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The recomputed signature does not match the provided one.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The verification time is past `timestamp + expiration`.
    #[error("Request has expired")]
    RequestExpired,

    /// The verification time is before the signing timestamp.
    #[error("Request is not yet valid")]
    RequestNotYetValid,
}

impl AuthError {
    /// Whether this error was raised while producing a signature, as opposed
    /// to while verifying one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bcestack_auth::AuthError;
    ///
    /// assert!(AuthError::InvalidExpiration.is_signing_error());
    /// assert!(!AuthError::SignatureDoesNotMatch.is_signing_error());
    /// ```
    #[must_use]
    pub fn is_signing_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential(_)
                | Self::ClockSkew(_)
                | Self::InvalidExpiration
                | Self::ExpirationTooLarge { .. }
        )
    }
}
