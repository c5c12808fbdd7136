//! Request authentication and ACL authorization.
//!
//! A request authenticates with an `Authorization` header or presigned query
//! parameters; one with neither is anonymous. Anonymous requests are then
//! allowed only where a bucket ACL grants `*` the needed permission.

use bcestack_auth::canonical::RequestParts;
use bcestack_auth::presigned::{is_presigned, verify_presigned_at};
use bcestack_auth::{CredentialProvider, verify_at};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::LocalServiceError;
use crate::router::{BosOperation, BosRequest};
use crate::state::BosServiceState;

/// Who sent a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    /// A verified access key.
    Account {
        /// The access key id the request was signed with.
        access_key_id: String,
    },
    /// No credentials.
    Anonymous,
}

impl Requester {
    /// Whether the request carried no credentials.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

/// Verify the signature of a request at `now`.
///
/// # Errors
///
/// Returns [`LocalServiceError::Auth`] when a signature is present but does
/// not verify.
pub fn authenticate(
    request: &BosRequest,
    credential_provider: &dyn CredentialProvider,
    now: DateTime<Utc>,
) -> Result<Requester, LocalServiceError> {
    let headers = request.header_pairs();
    let parts = RequestParts {
        method: request.method.as_str(),
        path: &request.path,
        query: &request.query,
        headers: &headers,
    };

    let result = if is_presigned(&request.query) {
        verify_presigned_at(&parts, credential_provider, now)
    } else if request.headers.contains_key(http::header::AUTHORIZATION) {
        verify_at(&parts, credential_provider, now)
    } else {
        return Ok(Requester::Anonymous);
    };

    match result {
        Ok(auth) => {
            debug!(access_key_id = %auth.access_key_id, "request authenticated");
            Ok(Requester::Account {
                access_key_id: auth.access_key_id,
            })
        }
        Err(e) => {
            warn!(path = %request.path, error = %e, "rejected request signature");
            Err(e.into())
        }
    }
}

/// Check that `requester` may perform `operation`.
///
/// Authenticated accounts own every bucket. Anonymous requesters need a
/// bucket ACL granting the operation's permission.
///
/// # Errors
///
/// - [`LocalServiceError::AccessDenied`] when an anonymous requester lacks
///   the permission, or asks for an account-only operation
/// - [`LocalServiceError::NoSuchBucket`] when the bucket does not exist
pub fn authorize(
    state: &BosServiceState,
    requester: &Requester,
    operation: BosOperation,
    bucket: Option<&str>,
) -> Result<(), LocalServiceError> {
    if !requester.is_anonymous() {
        return Ok(());
    }

    let denied = |message: String| {
        warn!(operation = %operation, "anonymous request denied");
        LocalServiceError::AccessDenied { message }
    };

    let Some(permission) = operation.anonymous_permission() else {
        return Err(denied(format!("{operation} requires credentials")));
    };
    let Some(bucket) = bucket else {
        return Err(denied(format!("{operation} requires credentials")));
    };

    if state.get_bucket(bucket)?.allows(None, permission) {
        Ok(())
    } else {
        Err(denied(format!(
            "anonymous requests may not perform {operation} on {bucket}"
        )))
    }
}
