//! Local service error types.
//!
//! Defines [`LocalServiceError`], the error enum of the in-memory service.
//! Each variant maps to a [`BosErrorCode`] through the [`From`] conversion
//! into [`BosError`], which the provider renders as a JSON error body.
//!
//! # Usage
//!
//! ```
//! use bcestack_bos_local::error::LocalServiceError;
//! use bcestack_bos_model::{BosError, BosErrorCode};
//!
//! let err = LocalServiceError::NoSuchBucket {
//!     bucket: "my-bucket".to_owned(),
//! };
//! let wire: BosError = err.into();
//! assert_eq!(wire.code, BosErrorCode::NoSuchBucket);
//! assert_eq!(wire.status_code, http::StatusCode::NOT_FOUND);
//! ```

use bcestack_auth::AuthError;
use bcestack_bos_model::{BosError, BosErrorCode};

/// Local service error type.
#[derive(Debug, thiserror::Error)]
pub enum LocalServiceError {
    // -----------------------------------------------------------------------
    // Bucket errors
    // -----------------------------------------------------------------------
    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// The bucket name is already taken.
    #[error("The requested bucket name is not available: {bucket}")]
    BucketAlreadyExists {
        /// The bucket name that already exists.
        bucket: String,
    },

    /// The bucket still holds objects.
    #[error("The bucket you tried to delete is not empty: {bucket}")]
    BucketNotEmpty {
        /// The bucket name.
        bucket: String,
    },

    /// The bucket name breaks the naming rules.
    #[error("The specified bucket is not valid: {name}: {reason}")]
    InvalidBucketName {
        /// The rejected name.
        name: String,
        /// Which rule it breaks.
        reason: String,
    },

    // -----------------------------------------------------------------------
    // Object errors
    // -----------------------------------------------------------------------
    /// The specified key does not exist.
    #[error("The specified key does not exist: {key}")]
    NoSuchKey {
        /// The key that was not found.
        key: String,
    },

    /// The requested range is outside the object.
    #[error("The requested range cannot be satisfied")]
    InvalidRange,

    // -----------------------------------------------------------------------
    // Multipart errors
    // -----------------------------------------------------------------------
    /// The upload does not exist, or was completed or aborted.
    #[error("The specified multipart upload does not exist: {upload_id}")]
    NoSuchUpload {
        /// The upload id that was not found.
        upload_id: String,
    },

    // -----------------------------------------------------------------------
    // Request errors
    // -----------------------------------------------------------------------
    /// A request parameter or header is invalid.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What is wrong.
        message: String,
    },

    /// A JSON request body could not be decoded.
    #[error("The JSON you provided was not well-formed: {message}")]
    MalformedJson {
        /// Decoder message.
        message: String,
    },

    /// No operation exists for this method on this resource.
    #[error("The specified method is not allowed against this resource: {method}")]
    MethodNotAllowed {
        /// The request method.
        method: String,
    },

    /// The requester may not perform the operation.
    #[error("Access Denied: {message}")]
    AccessDenied {
        /// Why access was refused.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Passthrough
    // -----------------------------------------------------------------------
    /// Signature verification failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A shared model check failed (part numbers, completion lists, digests).
    #[error(transparent)]
    Bos(#[from] BosError),

    // -----------------------------------------------------------------------
    // Internal / catch-all
    // -----------------------------------------------------------------------
    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LocalServiceError {
    /// Convert this error into a wire [`BosError`].
    ///
    /// This is equivalent to `BosError::from(self)` but available as a
    /// method for convenience in chained calls.
    #[must_use]
    pub fn into_bos_error(self) -> BosError {
        BosError::from(self)
    }
}

impl From<LocalServiceError> for BosError {
    fn from(err: LocalServiceError) -> Self {
        match err {
            LocalServiceError::Auth(e) => BosError::from(e),
            LocalServiceError::Bos(e) => e,
            other => {
                let code = error_code(&other);
                BosError::with_message(code, other.to_string())
            }
        }
    }
}

/// Map a [`LocalServiceError`] variant to the corresponding [`BosErrorCode`].
fn error_code(err: &LocalServiceError) -> BosErrorCode {
    match err {
        LocalServiceError::NoSuchBucket { .. } => BosErrorCode::NoSuchBucket,
        LocalServiceError::BucketAlreadyExists { .. } => BosErrorCode::BucketAlreadyExists,
        LocalServiceError::BucketNotEmpty { .. } => BosErrorCode::BucketNotEmpty,
        LocalServiceError::InvalidBucketName { .. } => BosErrorCode::InvalidBucketName,
        LocalServiceError::NoSuchKey { .. } => BosErrorCode::NoSuchKey,
        LocalServiceError::InvalidRange => BosErrorCode::InvalidRange,
        LocalServiceError::NoSuchUpload { .. } => BosErrorCode::NoSuchUpload,
        LocalServiceError::InvalidArgument { .. } => BosErrorCode::InvalidArgument,
        LocalServiceError::MalformedJson { .. } => BosErrorCode::MalformedJson,
        LocalServiceError::MethodNotAllowed { .. } => BosErrorCode::MethodNotAllowed,
        LocalServiceError::AccessDenied { .. } => BosErrorCode::AccessDenied,
        LocalServiceError::Bos(e) => e.code.clone(),
        // Auth errors are converted whole before reaching here.
        LocalServiceError::Auth(_) | LocalServiceError::Internal(_) => BosErrorCode::InternalError,
    }
}
