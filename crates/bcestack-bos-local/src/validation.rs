//! Request validation.
//!
//! Bucket naming rules and object key limits, checked before any state is
//! touched.

use crate::error::LocalServiceError;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;
/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;
/// Maximum object key length in bytes.
const MAX_OBJECT_KEY_LEN: usize = 1024;

/// Validate a BOS bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - only lowercase letters, numbers and hyphens
/// - starts and ends with a letter or number
///
/// # Errors
///
/// Returns [`LocalServiceError::InvalidBucketName`] naming the broken rule.
///
/// # Examples
///
/// ```
/// use bcestack_bos_local::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-bucket-01").is_ok());
/// assert!(validate_bucket_name("My_Bucket").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), LocalServiceError> {
    let invalid = |reason: &str| LocalServiceError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    let len = name.len();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(&format!(
            "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
        )));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(invalid(
            "Bucket name must only contain lowercase letters, numbers, and hyphens",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[len - 1];
    if first == b'-' || last == b'-' {
        return Err(invalid("Bucket name must start and end with a letter or number"));
    }

    Ok(())
}

/// Validate an object key: 1-1024 bytes.
///
/// # Errors
///
/// Returns [`LocalServiceError::InvalidArgument`] for an empty or overlong
/// key.
pub fn validate_object_key(key: &str) -> Result<(), LocalServiceError> {
    if key.is_empty() {
        return Err(LocalServiceError::InvalidArgument {
            message: "Object key must not be empty".to_owned(),
        });
    }
    if key.len() > MAX_OBJECT_KEY_LEN {
        return Err(LocalServiceError::InvalidArgument {
            message: format!("Object key must be at most {MAX_OBJECT_KEY_LEN} bytes"),
        });
    }
    Ok(())
}
