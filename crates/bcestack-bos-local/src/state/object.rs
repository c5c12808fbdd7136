//! Stored objects.

use bcestack_bos_model::ObjectMetadata;
use bcestack_bos_model::checksum::md5_hex;
use bytes::Bytes;
use chrono::{DateTime, SubsecRound, Utc};

/// One object: its bytes plus the metadata served with it.
///
/// `metadata` always carries the server-owned fields (`e_tag`,
/// `content_length`, `last_modified`).
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object key.
    pub key: String,
    /// Object content.
    pub data: Bytes,
    /// Content type, user metadata and server-owned fields.
    pub metadata: ObjectMetadata,
}

impl StoredObject {
    /// Store `data` under `key`, with the hex MD5 of the data as ETag.
    #[must_use]
    pub fn new(key: impl Into<String>, data: Bytes, metadata: ObjectMetadata) -> Self {
        let e_tag = md5_hex(&data);
        Self::with_etag(key, data, metadata, e_tag)
    }

    /// Store `data` under `key` with a precomputed ETag.
    ///
    /// The modification time is truncated to whole seconds, the precision of
    /// the `Last-Modified` header.
    #[must_use]
    pub fn with_etag(
        key: impl Into<String>,
        data: Bytes,
        mut metadata: ObjectMetadata,
        e_tag: String,
    ) -> Self {
        metadata.content_length = Some(data.len() as u64);
        metadata.content_md5 = None;
        metadata.e_tag = Some(e_tag);
        metadata.last_modified = Some(Utc::now().trunc_subsecs(0));
        if metadata.content_type.is_none() {
            metadata.content_type = Some("application/octet-stream".to_owned());
        }
        Self {
            key: key.into(),
            data,
            metadata,
        }
    }

    /// Content length in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Unquoted ETag.
    #[must_use]
    pub fn e_tag(&self) -> &str {
        self.metadata.e_tag.as_deref().unwrap_or_default()
    }

    /// Last modification time.
    #[must_use]
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.metadata.last_modified.unwrap_or_default()
    }
}
