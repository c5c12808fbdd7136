//! BOS error codes and the structured error returned by every operation.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use bcestack_auth::AuthError;
use serde::{Deserialize, Serialize};

use crate::transport::TransportError;

/// Well-known BOS error codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum BosErrorCode {
    /// The access key id or secret key is empty or malformed.
    InvalidCredential,
    /// The service rejected the request signature.
    AuthenticationFailed,
    /// The signing timestamp could not be produced or parsed.
    ClockSkew,
    /// The bucket does not exist.
    NoSuchBucket,
    /// The object does not exist.
    NoSuchKey,
    /// The multipart upload does not exist or is no longer active.
    NoSuchUpload,
    /// A part in a completion request is unknown, duplicated or mismatched.
    InvalidPart,
    /// A non-final part is below the minimum part size.
    EntityTooSmall,
    /// A presign expiration of zero seconds.
    InvalidExpiration,
    /// A presign expiration above the maximum.
    ExpirationTooLarge,
    /// The caller may not access the resource.
    AccessDenied,
    /// The upload session is in the wrong state for the operation.
    InvalidSessionState,
    /// A request argument is out of range or malformed.
    InvalidArgument,
    /// The requested byte range cannot be satisfied.
    InvalidRange,
    /// The `Content-MD5` does not match the received bytes.
    BadDigest,
    /// The bucket name is not valid.
    InvalidBucketName,
    /// The bucket name is already taken.
    BucketAlreadyExists,
    /// The bucket still holds objects.
    BucketNotEmpty,
    /// A JSON request body is malformed or empty.
    MalformedJson,
    /// The method is not allowed against this resource.
    MethodNotAllowed,
    /// The service failed internally.
    #[default]
    InternalError,
    /// The transport could not deliver the request or read the response.
    TransportFailure,
    /// A code the client does not recognise, kept verbatim.
    Custom(String),
}

impl BosErrorCode {
    /// Returns the error code as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidCredential => "InvalidCredential",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::ClockSkew => "ClockSkew",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchUpload => "NoSuchUpload",
            Self::InvalidPart => "InvalidPart",
            Self::EntityTooSmall => "EntityTooSmall",
            Self::InvalidExpiration => "InvalidExpiration",
            Self::ExpirationTooLarge => "ExpirationTooLarge",
            Self::AccessDenied => "AccessDenied",
            Self::InvalidSessionState => "InvalidSessionState",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidRange => "InvalidRange",
            Self::BadDigest => "BadDigest",
            Self::InvalidBucketName => "InvalidBucketName",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::MalformedJson => "MalformedJSON",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::InternalError => "InternalError",
            Self::TransportFailure => "TransportFailure",
            Self::Custom(s) => s,
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::InvalidCredential
            | Self::ClockSkew
            | Self::InvalidPart
            | Self::EntityTooSmall
            | Self::InvalidExpiration
            | Self::ExpirationTooLarge
            | Self::InvalidArgument
            | Self::BadDigest
            | Self::InvalidBucketName
            | Self::MalformedJson => http::StatusCode::BAD_REQUEST,
            Self::AuthenticationFailed | Self::AccessDenied => http::StatusCode::FORBIDDEN,
            Self::NoSuchBucket | Self::NoSuchKey | Self::NoSuchUpload => {
                http::StatusCode::NOT_FOUND
            }
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidSessionState | Self::BucketAlreadyExists | Self::BucketNotEmpty => {
                http::StatusCode::CONFLICT
            }
            Self::InvalidRange => http::StatusCode::RANGE_NOT_SATISFIABLE,
            Self::TransportFailure => http::StatusCode::BAD_GATEWAY,
            Self::InternalError | Self::Custom(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the default message for this error.
    #[must_use]
    pub fn default_message(&self) -> &str {
        match self {
            Self::InvalidCredential => "The access key id or secret key is invalid",
            Self::AuthenticationFailed => "The request signature could not be verified",
            Self::ClockSkew => "The signing timestamp is invalid",
            Self::NoSuchBucket => "The specified bucket does not exist",
            Self::NoSuchKey => "The specified key does not exist",
            Self::NoSuchUpload => "The specified multipart upload does not exist",
            Self::InvalidPart => "One or more of the specified parts could not be found",
            Self::EntityTooSmall => "Your proposed upload is smaller than the minimum allowed size",
            Self::InvalidExpiration => "The expiration must be greater than zero seconds",
            Self::ExpirationTooLarge => "The expiration exceeds the maximum allowed",
            Self::AccessDenied => "Access Denied",
            Self::InvalidSessionState => {
                "The operation is not valid for the current state of the upload"
            }
            Self::InvalidArgument => "Invalid Argument",
            Self::InvalidRange => "The requested range cannot be satisfied",
            Self::BadDigest => "The Content-MD5 you specified did not match what we received",
            Self::InvalidBucketName => "The specified bucket is not valid",
            Self::BucketAlreadyExists => "The requested bucket name is not available",
            Self::BucketNotEmpty => "The bucket you tried to delete is not empty",
            Self::MalformedJson => "The JSON you provided was not well-formed",
            Self::MethodNotAllowed => "The specified method is not allowed against this resource",
            Self::InternalError => "Internal server error",
            Self::TransportFailure => "The request could not be delivered",
            Self::Custom(s) => s,
        }
    }
}

impl fmt::Display for BosErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BosErrorCode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "InvalidCredential" => Self::InvalidCredential,
            "AuthenticationFailed" => Self::AuthenticationFailed,
            "ClockSkew" => Self::ClockSkew,
            "NoSuchBucket" => Self::NoSuchBucket,
            "NoSuchKey" => Self::NoSuchKey,
            "NoSuchUpload" => Self::NoSuchUpload,
            "InvalidPart" => Self::InvalidPart,
            "EntityTooSmall" => Self::EntityTooSmall,
            "InvalidExpiration" => Self::InvalidExpiration,
            "ExpirationTooLarge" => Self::ExpirationTooLarge,
            "AccessDenied" => Self::AccessDenied,
            "InvalidSessionState" => Self::InvalidSessionState,
            "InvalidArgument" => Self::InvalidArgument,
            "InvalidRange" => Self::InvalidRange,
            "BadDigest" => Self::BadDigest,
            "InvalidBucketName" => Self::InvalidBucketName,
            "BucketAlreadyExists" => Self::BucketAlreadyExists,
            "BucketNotEmpty" => Self::BucketNotEmpty,
            "MalformedJSON" | "MalformedJson" => Self::MalformedJson,
            "MethodNotAllowed" => Self::MethodNotAllowed,
            "InternalError" => Self::InternalError,
            "TransportFailure" => Self::TransportFailure,
            other => Self::Custom(other.to_owned()),
        })
    }
}

/// The JSON error body: `{"code": ..., "message": ..., "requestId": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Wire error code.
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Request id assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// A BOS error.
#[derive(Debug)]
pub struct BosError {
    /// The error code.
    pub code: BosErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The resource that caused the error.
    pub resource: Option<String>,
    /// The request ID.
    pub request_id: Option<String>,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for BosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BosError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for BosError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl BosError {
    /// Create a new error with the code's default message and status.
    #[must_use]
    pub fn new(code: BosErrorCode) -> Self {
        let status_code = code.default_status_code();
        let message = code.default_message().to_owned();
        Self {
            code,
            message,
            resource: None,
            request_id: None,
            status_code,
            source: None,
        }
    }

    /// Create a new error with a custom message.
    #[must_use]
    pub fn with_message(code: BosErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            resource: None,
            request_id: None,
            source: None,
        }
    }

    /// Set the resource that caused this error.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Override the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status_code: http::StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a NoSuchBucket error.
    #[must_use]
    pub fn no_such_bucket(bucket: impl Into<String>) -> Self {
        Self::new(BosErrorCode::NoSuchBucket).with_resource(bucket)
    }

    /// Create a NoSuchKey error.
    #[must_use]
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::new(BosErrorCode::NoSuchKey).with_resource(key)
    }

    /// Create a NoSuchUpload error.
    #[must_use]
    pub fn no_such_upload(upload_id: impl Into<String>) -> Self {
        Self::new(BosErrorCode::NoSuchUpload).with_resource(upload_id)
    }

    /// Create an InvalidPart error.
    #[must_use]
    pub fn invalid_part(message: impl Into<String>) -> Self {
        Self::with_message(BosErrorCode::InvalidPart, message)
    }

    /// Create an InvalidArgument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message(BosErrorCode::InvalidArgument, message)
    }

    /// Create an InvalidSessionState error.
    #[must_use]
    pub fn invalid_session_state(message: impl Into<String>) -> Self {
        Self::with_message(BosErrorCode::InvalidSessionState, message)
    }

    /// Create a MalformedJson error.
    #[must_use]
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::with_message(BosErrorCode::MalformedJson, message)
    }

    /// Create an InternalError.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(BosErrorCode::InternalError, message)
    }

    /// Render this error as a wire error body.
    #[must_use]
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.as_str().to_owned(),
            message: self.message.clone(),
            request_id: self.request_id.clone(),
        }
    }

    /// Rebuild an error from a response status and its decoded error body.
    ///
    /// # Examples
    ///
    /// ```
    /// use bcestack_bos_model::error::{BosError, BosErrorCode, ErrorBody};
    ///
    /// let body = ErrorBody {
    ///     code: "NoSuchKey".to_owned(),
    ///     message: "gone".to_owned(),
    ///     request_id: Some("req-1".to_owned()),
    /// };
    /// let err = BosError::from_error_body(http::StatusCode::NOT_FOUND, body);
    /// assert_eq!(err.code, BosErrorCode::NoSuchKey);
    /// assert_eq!(err.request_id.as_deref(), Some("req-1"));
    /// ```
    #[must_use]
    pub fn from_error_body(status_code: http::StatusCode, body: ErrorBody) -> Self {
        let Ok(code) = body.code.parse::<BosErrorCode>();
        let message = if body.message.is_empty() {
            code.default_message().to_owned()
        } else {
            body.message
        };
        Self {
            code,
            message,
            resource: None,
            request_id: body.request_id,
            status_code,
            source: None,
        }
    }
}

impl From<AuthError> for BosError {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::InvalidCredential(_) => BosErrorCode::InvalidCredential,
            AuthError::ClockSkew(_) => BosErrorCode::ClockSkew,
            AuthError::InvalidExpiration => BosErrorCode::InvalidExpiration,
            AuthError::ExpirationTooLarge { .. } => BosErrorCode::ExpirationTooLarge,
            AuthError::MissingAuthorization => BosErrorCode::AccessDenied,
            AuthError::InvalidAuthorization(_)
            | AuthError::UnsupportedVersion(_)
            | AuthError::MissingHeader(_)
            | AuthError::MissingQueryParam(_)
            | AuthError::AccessKeyNotFound(_)
            | AuthError::SignatureDoesNotMatch
            | AuthError::RequestExpired
            | AuthError::RequestNotYetValid => BosErrorCode::AuthenticationFailed,
        };
        Self::with_message(code, err.to_string()).with_source(err)
    }
}

impl From<TransportError> for BosError {
    fn from(err: TransportError) -> Self {
        Self::with_message(BosErrorCode::TransportFailure, err.to_string()).with_source(err)
    }
}
