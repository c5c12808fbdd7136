//! BOS client for bcestack.
//!
//! [`BosClient`] signs every request with `bce-auth-v1`, sends it through a
//! [`bcestack_bos_model::Transport`] and decodes the BOS JSON wire format.
//! Multipart uploads are coordinated by an [`UploadSession`].
//!
//! # Architecture
//!
//! ```text
//! BosClient (ops::{object, multipart, bucket, presign})
//!        |                          |
//!        v                          v
//!   UploadSession           bcestack-auth (signer, presigned URLs)
//!        |
//!        v
//!   Transport (in-memory service, or any HTTP stack)
//! ```

pub mod client;
pub mod config;
pub mod mimetypes;
mod ops;
pub mod session;

pub use client::BosClient;
pub use config::BosClientConfig;
pub use session::{CompletedUpload, UploadSession, UploadStatus};
