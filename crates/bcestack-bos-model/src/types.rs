//! Shared BOS data types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Object metadata sent on writes and returned on reads.
///
/// `e_tag` is the unquoted hex MD5 (or multipart ETag); the quotes only
/// exist on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// `Content-Type`.
    pub content_type: Option<String>,
    /// `Content-Length`. On writes, truncates the body when shorter.
    pub content_length: Option<u64>,
    /// Base64 MD5 of the content (`Content-MD5`).
    pub content_md5: Option<String>,
    /// User metadata (`x-bce-meta-*`).
    pub user_metadata: BTreeMap<String, String>,
    /// Server-assigned ETag.
    pub e_tag: Option<String>,
    /// Server-assigned modification time.
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectMetadata {
    /// Metadata with only a content type.
    #[must_use]
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }

    /// Add one user metadata entry.
    #[must_use]
    pub fn with_user_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_metadata.insert(key.into(), value.into());
        self
    }

    /// Fill fields that are unset here from `other`. Existing values win,
    /// including existing user metadata keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use bcestack_bos_model::types::ObjectMetadata;
    ///
    /// let mut initiated = ObjectMetadata::with_content_type("text/plain")
    ///     .with_user_metadata("a", "init");
    /// let completion = ObjectMetadata::with_content_type("image/png")
    ///     .with_user_metadata("a", "late")
    ///     .with_user_metadata("b", "late");
    ///
    /// initiated.merge_missing_from(&completion);
    /// assert_eq!(initiated.content_type.as_deref(), Some("text/plain"));
    /// assert_eq!(initiated.user_metadata["a"], "init");
    /// assert_eq!(initiated.user_metadata["b"], "late");
    /// ```
    pub fn merge_missing_from(&mut self, other: &ObjectMetadata) {
        if self.content_type.is_none() {
            self.content_type.clone_from(&other.content_type);
        }
        if self.content_length.is_none() {
            self.content_length = other.content_length;
        }
        if self.content_md5.is_none() {
            self.content_md5.clone_from(&other.content_md5);
        }
        for (key, value) in &other.user_metadata {
            self.user_metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// One uploaded part as recorded by the session or the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartInfo {
    /// Part number, `1..=10000`.
    pub part_number: u32,
    /// Unquoted hex MD5 of the part bytes.
    pub e_tag: String,
    /// Part size in bytes.
    pub size: u64,
    /// When the part was uploaded.
    pub last_modified: DateTime<Utc>,
}

impl PartInfo {
    /// The `{part_number, e_tag}` pair a completion request lists.
    #[must_use]
    pub fn to_part_etag(&self) -> PartETag {
        PartETag {
            part_number: self.part_number,
            e_tag: self.e_tag.clone(),
        }
    }
}

/// A part reference in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartETag {
    /// Part number.
    pub part_number: u32,
    /// ETag returned when the part was uploaded.
    pub e_tag: String,
}

impl PartETag {
    /// Create a part reference.
    #[must_use]
    pub fn new(part_number: u32, e_tag: impl Into<String>) -> Self {
        Self {
            part_number,
            e_tag: e_tag.into(),
        }
    }
}

/// Resource owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Owner id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
}

/// A bucket in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    /// Bucket name.
    pub name: String,
    /// Region the bucket lives in.
    pub location: String,
    /// Creation time.
    pub creation_date: DateTime<Utc>,
}

/// An in-progress multipart upload in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Initiator.
    pub owner: Owner,
    /// Initiation time.
    pub initiated: DateTime<Utc>,
    /// Storage class.
    #[serde(default)]
    pub storage_class: String,
}

/// A permission granted by a bucket ACL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Read objects and listings.
    Read,
    /// Write and delete objects.
    Write,
    /// Everything, including ACL changes.
    FullControl,
}

/// A grantee. The id `*` stands for every requester, including anonymous ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grantee {
    /// User id, or `*`.
    pub id: String,
}

impl Grantee {
    /// The grantee id matching every requester.
    pub const ANYONE: &'static str = "*";

    /// Create a grantee.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The grantee matching every requester.
    #[must_use]
    pub fn anyone() -> Self {
        Self::new(Self::ANYONE)
    }
}

/// One entry of a bucket ACL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Who the permissions apply to.
    pub grantee: Vec<Grantee>,
    /// What they may do.
    pub permission: Vec<Permission>,
}

impl Grant {
    /// Whether this grant gives `permission` to the requester `id`
    /// (`None` for anonymous requesters).
    #[must_use]
    pub fn allows(&self, id: Option<&str>, permission: Permission) -> bool {
        let matches_grantee = self
            .grantee
            .iter()
            .any(|g| g.id == Grantee::ANYONE || Some(g.id.as_str()) == id);
        let matches_permission = self
            .permission
            .iter()
            .any(|p| *p == permission || *p == Permission::FullControl);
        matches_grantee && matches_permission
    }
}

/// Canned bucket ACLs, sent in the `x-bce-acl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CannedAcl {
    /// Only the owner has access.
    #[default]
    Private,
    /// Anyone may read.
    PublicRead,
    /// Anyone may read and write.
    PublicReadWrite,
}

impl CannedAcl {
    /// Wire form of the canned ACL.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
        }
    }

    /// Expand into explicit grants for a bucket owned by `owner_id`.
    #[must_use]
    pub fn to_grants(self, owner_id: &str) -> Vec<Grant> {
        let mut grants = vec![Grant {
            grantee: vec![Grantee::new(owner_id)],
            permission: vec![Permission::FullControl],
        }];
        match self {
            Self::Private => {}
            Self::PublicRead => grants.push(Grant {
                grantee: vec![Grantee::anyone()],
                permission: vec![Permission::Read],
            }),
            Self::PublicReadWrite => grants.push(Grant {
                grantee: vec![Grantee::anyone()],
                permission: vec![Permission::Read, Permission::Write],
            }),
        }
        grants
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            other => Err(format!("unknown canned ACL: {other}")),
        }
    }
}

/// What a copy does with the source object's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MetadataDirective {
    /// Keep the source metadata.
    #[default]
    Copy,
    /// Replace it with the metadata sent with the copy.
    Replace,
}

impl MetadataDirective {
    /// Wire form (`x-bce-metadata-directive`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Replace => "replace",
        }
    }
}

impl FromStr for MetadataDirective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "replace" => Ok(Self::Replace),
            other => Err(format!("unknown metadata directive: {other}")),
        }
    }
}
