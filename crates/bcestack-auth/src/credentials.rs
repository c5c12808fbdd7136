//! Credentials used to sign and verify requests.
//!
//! [`CredentialContext`] is the immutable value a client signs with. The
//! verifying side resolves secret keys through a [`CredentialProvider`];
//! [`StaticCredentialProvider`] is the in-memory implementation used by the
//! local BOS service and by tests.

use std::collections::HashMap;
use std::fmt;

use crate::error::AuthError;

/// An access key pair plus an optional session token.
///
/// Owned by the caller and passed by reference into every signing call.
///
/// # Examples
///
/// ```
/// use bcestack_auth::credentials::CredentialContext;
///
/// let creds = CredentialContext::new("ak", "sk").with_session_token("token");
/// assert_eq!(creds.access_key_id(), "ak");
/// assert_eq!(creds.session_token(), Some("token"));
/// assert!(!format!("{creds:?}").contains("sk"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialContext {
    access_key_id: String,
    secret_key: String,
    session_token: Option<String>,
}

impl CredentialContext {
    /// Create credentials from an access key id and secret key.
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token (temporary credentials).
    #[must_use]
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    /// The access key id.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret key.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// The session token, if these are temporary credentials.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Check that both halves of the key pair are present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] if the access key id or the
    /// secret key is empty or blank.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.access_key_id.trim().is_empty() {
            return Err(AuthError::InvalidCredential(
                "access key id is empty".to_owned(),
            ));
        }
        if self.access_key_id.contains('/') {
            return Err(AuthError::InvalidCredential(
                "access key id must not contain '/'".to_owned(),
            ));
        }
        if self.secret_key.trim().is_empty() {
            return Err(AuthError::InvalidCredential("secret key is empty".to_owned()));
        }
        Ok(())
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Trait for looking up secret keys by access key id.
///
/// Implementations may back this with a database, configuration file,
/// or any other credential store.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the secret key for the given access key id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyNotFound`] if the access key id is not recognized.
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError>;
}

/// A simple in-memory credential provider backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use bcestack_auth::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(vec![
///     ("ak".to_owned(), "sk".to_owned()),
/// ]);
///
/// assert_eq!(provider.get_secret_key("ak").unwrap(), "sk");
/// assert!(provider.get_secret_key("other").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, String>,
}

impl StaticCredentialProvider {
    /// Create a provider from an iterable of (access_key_id, secret_key) pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }

    /// Register one more key pair.
    pub fn insert(&mut self, access_key_id: impl Into<String>, secret_key: impl Into<String>) {
        self.credentials
            .insert(access_key_id.into(), secret_key.into());
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError> {
        self.credentials
            .get(access_key_id)
            .cloned()
            .ok_or_else(|| AuthError::AccessKeyNotFound(access_key_id.to_owned()))
    }
}
