//! Client configuration.
//!
//! [`BosClientConfig`] names the endpoint, the optional credentials and the
//! defaults the client applies to signing and multipart uploads. It can be
//! built with a typed builder or loaded from environment variables.

use std::fmt;

use bcestack_auth::CredentialContext;
use bcestack_auth::signer::DEFAULT_EXPIRATION_SECONDS;
use bcestack_bos_model::multipart::MIN_PART_SIZE;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default BOS endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://bj.bcebos.com";

/// BOS client configuration.
///
/// A client without both an access key id and a secret key is anonymous: it
/// sends unsigned requests and relies on bucket ACLs.
///
/// # Examples
///
/// ```
/// use bcestack_bos_core::config::BosClientConfig;
///
/// let config = BosClientConfig::builder()
///     .endpoint("http://localhost:8080".into())
///     .access_key_id("ak".into())
///     .secret_access_key("sk".into())
///     .build();
/// assert!(config.credentials().is_some());
/// assert_eq!(config.presign_expiration_seconds, 1800);
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BosClientConfig {
    /// Scheme and authority of the service, e.g. `http://bj.bcebos.com`.
    #[builder(default = String::from(DEFAULT_ENDPOINT))]
    pub endpoint: String,

    /// Access key id.
    #[builder(default, setter(strip_option))]
    pub access_key_id: Option<String>,

    /// Secret access key.
    #[builder(default, setter(strip_option))]
    pub secret_access_key: Option<String>,

    /// Session token of temporary credentials.
    #[builder(default, setter(strip_option))]
    pub session_token: Option<String>,

    /// Validity window of the `Authorization` header of live requests.
    #[builder(default = DEFAULT_EXPIRATION_SECONDS)]
    pub request_expiration_seconds: u32,

    /// Validity window of presigned URLs when the request names none.
    #[builder(default = DEFAULT_EXPIRATION_SECONDS)]
    pub presign_expiration_seconds: u32,

    /// Minimum size of every part but the last, checked at completion.
    #[builder(default = MIN_PART_SIZE)]
    pub min_part_size: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl fmt::Debug for BosClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BosClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_expiration_seconds", &self.request_expiration_seconds)
            .field("presign_expiration_seconds", &self.presign_expiration_seconds)
            .field("min_part_size", &self.min_part_size)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for BosClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            request_expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            presign_expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            min_part_size: MIN_PART_SIZE,
            log_level: String::from("info"),
        }
    }
}

impl BosClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BCE_ENDPOINT` | `http://bj.bcebos.com` |
    /// | `BCE_ACCESS_KEY_ID` | unset |
    /// | `BCE_SECRET_ACCESS_KEY` | unset |
    /// | `BCE_SESSION_TOKEN` | unset |
    /// | `BCE_REQUEST_EXPIRATION` | `1800` |
    /// | `BCE_PRESIGN_EXPIRATION` | `1800` |
    /// | `BOS_MIN_PART_SIZE` | `5242880` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable numbers keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BCE_ENDPOINT") {
            config.endpoint = v;
        }
        config.access_key_id = non_empty_var("BCE_ACCESS_KEY_ID");
        config.secret_access_key = non_empty_var("BCE_SECRET_ACCESS_KEY");
        config.session_token = non_empty_var("BCE_SESSION_TOKEN");
        if let Ok(v) = std::env::var("BCE_REQUEST_EXPIRATION") {
            if let Ok(n) = v.parse::<u32>() {
                config.request_expiration_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("BCE_PRESIGN_EXPIRATION") {
            if let Ok(n) = v.parse::<u32>() {
                config.presign_expiration_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("BOS_MIN_PART_SIZE") {
            if let Ok(n) = v.parse::<u64>() {
                config.min_part_size = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The signing credentials, or `None` for an anonymous client.
    #[must_use]
    pub fn credentials(&self) -> Option<CredentialContext> {
        let access_key_id = self.access_key_id.as_deref()?;
        let secret_access_key = self.secret_access_key.as_deref()?;
        let credentials = CredentialContext::new(access_key_id, secret_access_key);
        Some(match &self.session_token {
            Some(token) => credentials.with_session_token(token.clone()),
            None => credentials,
        })
    }

    /// The endpoint authority (`host[:port]`), used as the `Host` header.
    #[must_use]
    pub fn host(&self) -> &str {
        let without_scheme = self
            .endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, rest)| rest);
        without_scheme
            .split('/')
            .next()
            .unwrap_or(without_scheme)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
