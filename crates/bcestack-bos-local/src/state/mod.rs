//! In-memory service state.
//!
//! - [`BosServiceState`] -- top-level state owning all buckets
//! - [`BosBucket`] -- per-bucket objects, uploads and ACL
//! - [`StoredObject`] -- one object's bytes and metadata
//! - [`MultipartUpload`] / [`UploadPart`] -- multipart upload tracking
//!
//! # Thread Safety
//!
//! All types are `Send + Sync`. Concurrent access is handled via:
//!
//! - `DashMap` for the bucket table and each bucket's multipart table
//! - `parking_lot::RwLock` for each bucket's object map and ACL

pub(crate) mod bucket;
pub(crate) mod multipart;
pub(crate) mod object;
pub(crate) mod service;

pub use bucket::BosBucket;
pub use multipart::{MultipartUpload, UploadPart};
pub use object::StoredObject;
pub use service::BosServiceState;
