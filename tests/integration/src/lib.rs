//! End-to-end tests for bcestack.
//!
//! Every test drives a signing `BosClient` against an in-memory `LocalBos`
//! through the `Transport` trait, so no server or network is needed:
//! ```text
//! cargo test -p bcestack-integration
//! ```

use std::sync::{Arc, Once};

use bcestack_bos_core::{BosClient, BosClientConfig};
use bcestack_bos_local::{LocalBos, LocalBosConfig};

static INIT: Once = Once::new();

/// Endpoint the clients sign for.
pub const ENDPOINT: &str = "http://bos.test";
/// Access key id accepted by the service.
pub const ACCESS_KEY_ID: &str = "integration-ak";
/// Secret key paired with [`ACCESS_KEY_ID`].
pub const SECRET_ACCESS_KEY: &str = "integration-sk";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A fresh service accepting [`ACCESS_KEY_ID`]. Parts of any size are
/// accepted so tests can upload tiny parts.
#[must_use]
pub fn local_service() -> LocalBos {
    init_tracing();
    let config = LocalBosConfig::builder().min_part_size(1).build();
    LocalBos::new(config).with_credential(ACCESS_KEY_ID, SECRET_ACCESS_KEY)
}

/// A client signing with the given secret key.
#[must_use]
pub fn client_with_secret(service: &LocalBos, secret_access_key: &str) -> BosClient {
    let config = BosClientConfig::builder()
        .endpoint(ENDPOINT.to_owned())
        .access_key_id(ACCESS_KEY_ID.to_owned())
        .secret_access_key(secret_access_key.to_owned())
        .min_part_size(1)
        .build();
    BosClient::new(config, Arc::new(service.clone()))
}

/// A client signing with the service's credentials.
#[must_use]
pub fn bos_client(service: &LocalBos) -> BosClient {
    client_with_secret(service, SECRET_ACCESS_KEY)
}

/// A client without credentials.
#[must_use]
pub fn anonymous_client(service: &LocalBos) -> BosClient {
    let config = BosClientConfig::builder()
        .endpoint(ENDPOINT.to_owned())
        .min_part_size(1)
        .build();
    BosClient::new(config, Arc::new(service.clone()))
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name.
pub async fn create_test_bucket(client: &BosClient, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket(&name)
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

mod test_auth;
mod test_bucket;
mod test_multipart;
mod test_object;
mod test_presign;
