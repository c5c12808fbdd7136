//! In-memory BOS service for bcestack.
//!
//! [`LocalBos`] verifies `bce-auth-v1` signatures and presigned URLs, keeps
//! buckets, objects and multipart uploads in memory, and answers in the BOS
//! JSON wire format. It implements [`bcestack_bos_model::Transport`], so a
//! `BosClient` can run against it with no network in between.
//!
//! # Architecture
//!
//! ```text
//! Transport::send
//!        |
//!        v
//! router (BosRequest, BosOperation) -> auth (authenticate, authorize)
//!        |
//!        v
//! ops::{bucket, object, multipart} -> state (BosServiceState, BosBucket)
//! ```

pub mod auth;
pub mod config;
pub mod error;
mod ops;
mod provider;
pub mod router;
pub mod state;
pub mod utils;
pub mod validation;

pub use config::LocalBosConfig;
pub use error::LocalServiceError;
pub use provider::LocalBos;
