//! Local service configuration.
//!
//! Provides [`LocalBosConfig`] for configuring the in-memory BOS service.
//! Values can be built with a typed builder or loaded from environment
//! variables.

use std::collections::BTreeMap;
use std::fmt;

use bcestack_bos_model::multipart::MIN_PART_SIZE;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Local BOS service configuration.
///
/// # Examples
///
/// ```
/// use bcestack_bos_local::config::LocalBosConfig;
///
/// let config = LocalBosConfig::builder()
///     .credentials([("ak".to_owned(), "sk".to_owned())].into())
///     .build();
/// assert_eq!(config.region, "bj");
/// assert_eq!(config.credentials["ak"], "sk");
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct LocalBosConfig {
    /// Region reported by `get_bucket_location`.
    #[builder(default = String::from("bj"))]
    pub region: String,

    /// Id of the account owning every bucket.
    #[builder(default = String::from("bcestack-owner"))]
    pub owner_id: String,

    /// Display name of that account.
    #[builder(default = String::from("bcestack"))]
    pub owner_display_name: String,

    /// Accepted key pairs, access key id to secret key.
    #[builder(default)]
    pub credentials: BTreeMap<String, String>,

    /// Minimum size of every part but the last.
    #[builder(default = MIN_PART_SIZE)]
    pub min_part_size: u64,

    /// Size of the chunks object bodies are streamed in.
    #[builder(default = 64 * 1024)]
    pub response_chunk_size: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl fmt::Debug for LocalBosConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBosConfig")
            .field("region", &self.region)
            .field("owner_id", &self.owner_id)
            .field("owner_display_name", &self.owner_display_name)
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("min_part_size", &self.min_part_size)
            .field("response_chunk_size", &self.response_chunk_size)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for LocalBosConfig {
    fn default() -> Self {
        Self {
            region: String::from("bj"),
            owner_id: String::from("bcestack-owner"),
            owner_display_name: String::from("bcestack"),
            credentials: BTreeMap::new(),
            min_part_size: MIN_PART_SIZE,
            response_chunk_size: 64 * 1024,
            log_level: String::from("info"),
        }
    }
}

impl LocalBosConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BOS_REGION` | `bj` |
    /// | `BOS_OWNER_ID` | `bcestack-owner` |
    /// | `BCE_ACCESS_KEY_ID` + `BCE_SECRET_ACCESS_KEY` | no credentials |
    /// | `BOS_MIN_PART_SIZE` | `5242880` |
    /// | `BOS_RESPONSE_CHUNK_SIZE` | `65536` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Examples
    ///
    /// ```
    /// use bcestack_bos_local::config::LocalBosConfig;
    ///
    /// let config = LocalBosConfig::from_env();
    /// assert!(!config.region.is_empty());
    /// ```
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BOS_REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("BOS_OWNER_ID") {
            config.owner_id = v;
        }
        if let (Ok(ak), Ok(sk)) = (
            std::env::var("BCE_ACCESS_KEY_ID"),
            std::env::var("BCE_SECRET_ACCESS_KEY"),
        ) {
            if !ak.is_empty() && !sk.is_empty() {
                config.credentials.insert(ak, sk);
            }
        }
        if let Ok(v) = std::env::var("BOS_MIN_PART_SIZE") {
            if let Ok(n) = v.parse::<u64>() {
                config.min_part_size = n;
            }
        }
        if let Ok(v) = std::env::var("BOS_RESPONSE_CHUNK_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                config.response_chunk_size = n.max(1);
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}
